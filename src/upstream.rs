//! DramaBox 上游接口
//! 剧场列表 / 搜索联想 / 章节批量加载, 每次调用独立获取令牌

use crate::http_client::{post_json, HttpClientError};
use crate::token::TokenProvider;
use crate::types::{
    AuthToken, ChapterBatch, Envelope, MovieRecord, RecordDefaults, SuggestData, TheaterData,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const THEATER_PATH: &str = "/drama-box/he001/theater";
const SUGGEST_PATH: &str = "/drama-box/search/suggest";
const CHAPTER_PATH: &str = "/drama-box/chapterv2/batch/load";

/// 列表类接口的客户端标识
const CATALOG_CID: &str = "DRA1000042";
/// 播放接口的客户端标识
const PLAYBACK_CID: &str = "DRA1000000";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("获取令牌失败: {0}")]
    Token(HttpClientError),
    #[error("上游请求失败: {0}")]
    Http(#[from] HttpClientError),
    #[error("上游响应异常: {0}")]
    Malformed(String),
}

/// 上游短剧数据源
///
/// 服务层只依赖这个 trait, 测试时用内存实现替换。
#[async_trait]
pub trait DramaSource: Send + Sync {
    /// 单次剧场列表查询 (channel, page, index)
    async fn theater_page(
        &self,
        channel_id: u32,
        page: u32,
        index: u32,
    ) -> Result<Vec<MovieRecord>, UpstreamError>;

    /// 单次关键词搜索
    async fn search(&self, keyword: &str) -> Result<Vec<MovieRecord>, UpstreamError>;

    /// 加载某一集所在的章节批次
    async fn chapters(&self, book_id: &str, index: u32) -> Result<ChapterBatch, UpstreamError>;
}

pub struct DramaBoxClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    defaults: RecordDefaults,
}

impl DramaBoxClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        defaults: RecordDefaults,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            defaults,
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        cid: &str,
        body: &serde_json::Value,
    ) -> Result<T, UpstreamError> {
        let token = self.tokens.fetch_token().await.map_err(UpstreamError::Token)?;
        let headers = build_headers(&token, cid)?;
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} {}", url, body);

        let envelope: Envelope<T> = post_json(&self.client, &url, body, headers).await?;
        envelope
            .data
            .ok_or_else(|| UpstreamError::Malformed(format!("{} 缺少 data 字段", path)))
    }
}

#[async_trait]
impl DramaSource for DramaBoxClient {
    async fn theater_page(
        &self,
        channel_id: u32,
        page: u32,
        index: u32,
    ) -> Result<Vec<MovieRecord>, UpstreamError> {
        let body = json!({
            "newChannelStyle": 1,
            "isNeedRank": 1,
            "pageNo": page,
            "index": index,
            "channelId": channel_id,
        });
        let data: TheaterData = self.post(THEATER_PATH, CATALOG_CID, &body).await?;
        let tag = format!("p{}_i{}_c{}", page, index, channel_id);

        Ok(data
            .new_theater_list
            .unwrap_or_default()
            .records
            .into_iter()
            .map(|raw| MovieRecord::from_theater(raw, channel_id, tag.clone(), &self.defaults))
            .collect())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<MovieRecord>, UpstreamError> {
        let body = json!({ "keyword": keyword });
        let data: SuggestData = self.post(SUGGEST_PATH, CATALOG_CID, &body).await?;

        Ok(data
            .suggest_list
            .into_iter()
            .map(|raw| MovieRecord::from_suggest(raw, &self.defaults))
            .collect())
    }

    async fn chapters(&self, book_id: &str, index: u32) -> Result<ChapterBatch, UpstreamError> {
        let body = json!({
            "boundaryIndex": 0,
            "comingPlaySectionId": -1,
            "index": index,
            "currencyPlaySource": "discover_new_rec_new",
            "needEndRecommend": 0,
            "currencyPlaySourceName": "",
            "preLoad": false,
            "rid": "",
            "pullCid": "",
            "loadDirection": 0,
            "startUpKey": "",
            "bookId": book_id,
        });
        self.post(CHAPTER_PATH, PLAYBACK_CID, &body).await
    }
}

/// 构建 DramaBox 请求头
fn build_headers(token: &AuthToken, cid: &str) -> Result<HeaderMap, UpstreamError> {
    let pairs = [
        ("tn", format!("Bearer {}", token.token)),
        ("version", "430".to_string()),
        ("vn", "4.3.0".to_string()),
        ("cid", cid.to_string()),
        ("package-name", "com.storymatrix.drama".to_string()),
        ("apn", "1".to_string()),
        ("device-id", token.deviceid.clone()),
        ("language", "in".to_string()),
        ("current-language", "in".to_string()),
        ("p", "43".to_string()),
        ("time-zone", "+0800".to_string()),
        ("content-type", "application/json; charset=UTF-8".to_string()),
    ];

    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let value = HeaderValue::from_str(&value)
            .map_err(|_| UpstreamError::Malformed(format!("非法请求头 {}", name)))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}
