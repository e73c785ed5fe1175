//! 数据类型定义
//! 上游 DramaBox 原始结构 + 归一化后的 MovieRecord

use chrono::Datelike;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// 归一化后的短剧记录
///
/// `book_id` 是聚合去重的唯一键, `source` 只记录来源, 不参与身份判断。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub book_id: String,
    pub title: String,
    pub chapter_count: u32,
    #[serde(rename = "poster")]
    pub poster_url: String,
    pub description: String,
    pub rating: f64,
    pub genre: String,
    pub play_count: String,
    pub year: i32,
    pub quality: String,
    pub duration: String,
    pub is_new: bool,
    pub is_popular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protagonist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_vo: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl MovieRecord {
    /// 设置来源标记 (插入结果集之前调用)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 记录命中该条目的搜索关键词
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// 关键词 (不区分大小写) 是否出现在标题、类型或简介中
    pub fn mentions(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.title.to_lowercase().contains(&keyword)
            || self.genre.to_lowercase().contains(&keyword)
            || self.description.to_lowercase().contains(&keyword)
    }

    /// 从剧场列表条目归一化
    pub fn from_theater(
        raw: TheaterRecord,
        channel_id: u32,
        tag: String,
        defaults: &RecordDefaults,
    ) -> Self {
        let is_new = raw
            .corner
            .as_ref()
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            == Some("Terbaru");
        let is_popular = raw
            .rank_vo
            .as_ref()
            .and_then(|r| r.get("rankType"))
            .and_then(Value::as_i64)
            == Some(3);

        Self {
            book_id: raw.book_id,
            title: raw.book_name.unwrap_or_else(|| defaults.title.clone()),
            chapter_count: raw.chapter_count.unwrap_or(defaults.chapter_count),
            poster_url: raw.cover_wap.unwrap_or_default(),
            description: raw
                .introduction
                .unwrap_or_else(|| defaults.description.clone()),
            rating: raw.score.unwrap_or(0.0),
            genre: join_tags(raw.tags, defaults),
            play_count: raw
                .play_count
                .map(stringify)
                .unwrap_or_else(|| defaults.play_count.clone()),
            year: defaults.year,
            quality: defaults.quality.clone(),
            duration: defaults.duration.clone(),
            is_new,
            is_popular,
            protagonist: None,
            corner: raw.corner,
            rank_vo: raw.rank_vo,
            channel_id: Some(channel_id),
            source: Some(tag),
            keyword: None,
        }
    }

    /// 从搜索联想条目归一化
    ///
    /// 搜索接口不返回集数和播放量, 统一使用默认值。
    pub fn from_suggest(raw: SuggestRecord, defaults: &RecordDefaults) -> Self {
        Self {
            book_id: raw.book_id,
            title: raw.book_name.unwrap_or_else(|| defaults.title.clone()),
            chapter_count: defaults.chapter_count,
            poster_url: raw.cover.unwrap_or_default(),
            description: raw
                .introduction
                .unwrap_or_else(|| defaults.description.clone()),
            rating: raw.score.unwrap_or(0.0),
            genre: join_tags(raw.tag_names, defaults),
            play_count: defaults.play_count.clone(),
            year: defaults.year,
            quality: defaults.quality.clone(),
            duration: defaults.duration.clone(),
            is_new: false,
            is_popular: false,
            protagonist: raw.protagonist,
            corner: None,
            rank_vo: None,
            channel_id: None,
            source: None,
            keyword: None,
        }
    }
}

fn join_tags(tags: Option<Vec<String>>, defaults: &RecordDefaults) -> String {
    match tags {
        Some(tags) if !tags.is_empty() => tags.join(", "),
        _ => defaults.genre.clone(),
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// 上游不提供的字段的默认值策略
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub title: String,
    pub description: String,
    pub genre: String,
    /// 集数未知时的占位值
    pub chapter_count: u32,
    pub play_count: String,
    pub quality: String,
    pub duration: String,
    pub year: i32,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            title: "Tanpa Judul".to_string(),
            description: String::new(),
            genre: "Drama".to_string(),
            chapter_count: 50,
            play_count: "0".to_string(),
            quality: "HD".to_string(),
            duration: "45 min".to_string(),
            year: chrono::Utc::now().year(),
        }
    }
}

// ============================================================================
// 上游原始结构
// ============================================================================

/// 逐条解析列表, 单条格式不对只丢弃该条
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("跳过无法解析的条目: {}", e);
                None
            }
        })
        .collect())
}

/// 上游统一响应包装 `{ data: ... }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheaterData {
    pub new_theater_list: Option<TheaterList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TheaterList {
    #[serde(default, deserialize_with = "lenient_list")]
    pub records: Vec<TheaterRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheaterRecord {
    pub book_id: String,
    pub book_name: Option<String>,
    pub chapter_count: Option<u32>,
    pub cover_wap: Option<String>,
    pub introduction: Option<String>,
    pub score: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub play_count: Option<Value>,
    pub corner: Option<Value>,
    pub rank_vo: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestData {
    #[serde(default, deserialize_with = "lenient_list")]
    pub suggest_list: Vec<SuggestRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRecord {
    pub book_id: String,
    pub book_name: Option<String>,
    pub cover: Option<String>,
    pub introduction: Option<String>,
    pub score: Option<f64>,
    pub tag_names: Option<Vec<String>>,
    pub protagonist: Option<String>,
}

/// 章节批量加载结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterBatch {
    #[serde(default)]
    pub chapter_list: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default)]
    pub cdn_list: Vec<CdnEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnEntry {
    pub cdn_domain: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub video_path_list: Vec<VideoPath>,
}

/// 单个清晰度的播放地址
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPath {
    pub quality: Option<u32>,
    #[serde(default)]
    pub video_path: String,
    #[serde(default)]
    pub is_default: Option<i64>,
}

/// 播放链接解析结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub url: String,
    pub title: String,
    pub duration: u32,
    pub episode_number: u32,
    pub qualities: Vec<VideoPath>,
    pub cdn_domain: Option<String>,
}

/// 授权令牌
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub deviceid: String,
}
