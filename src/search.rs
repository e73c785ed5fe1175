//! 增强搜索
//! 直接搜索 + 短关键词变体 + 剧场匹配 + 子串补充, 最后按相关度排序

use crate::collection::MovieSet;
use crate::core::Collector;
use crate::tables::KeywordTables;
use crate::throttle::Pacing;
use crate::types::MovieRecord;
use crate::upstream::{DramaSource, UpstreamError};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 变体阶段最多查询的变体数
const MAX_VARIATIONS: usize = 5;
/// 子串阶段最多查询的子串数
const MAX_SUBSTRINGS: usize = 3;
/// 结果少于该数量时才进入子串阶段
const SUBSTRING_THRESHOLD: usize = 20;

/// 分页后的搜索结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<MovieRecord>,
    pub current_page: usize,
    pub total_results: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct SearchEngine {
    source: Arc<dyn DramaSource>,
    collector: Collector,
    tables: Arc<KeywordTables>,
    pacing: Pacing,
}

impl SearchEngine {
    pub fn new(
        source: Arc<dyn DramaSource>,
        collector: Collector,
        tables: Arc<KeywordTables>,
        pacing: Pacing,
    ) -> Self {
        Self {
            source,
            collector,
            tables,
            pacing,
        }
    }

    /// 直接调用上游搜索
    pub async fn direct(&self, keyword: &str) -> Result<Vec<MovieRecord>, UpstreamError> {
        self.source.search(keyword).await
    }

    /// 多阶段增强搜索
    ///
    /// 每个阶段内的单次调用失败只记录日志。若直接搜索失败且没有任何结果,
    /// 视为整体失败, 退回到一次普通搜索 (不排序)。
    pub async fn enhanced(&self, keyword: &str) -> Result<Vec<MovieRecord>, UpstreamError> {
        info!("🔍 增强搜索: \"{}\"", keyword);
        let length = keyword.chars().count();
        let mut set = MovieSet::new();

        // 1. 直接搜索
        let direct_ok = match self.source.search(keyword).await {
            Ok(records) => {
                let added = set.extend(records.into_iter().map(|r| r.with_source("direct")));
                debug!("直接搜索: {} 条", added);
                true
            }
            Err(e) => {
                warn!("直接搜索失败: {}", e);
                false
            }
        };

        // 2. 短关键词变体
        if length <= 2 {
            let variations = generate_variations(keyword, &self.tables);
            for variation in variations.iter().take(MAX_VARIATIONS) {
                match self.source.search(variation).await {
                    Ok(records) => {
                        let tag = format!("variation-{}", variation);
                        let added =
                            set.extend(records.into_iter().map(|r| r.with_source(tag.as_str())));
                        debug!("变体 {}: 新增 {} 条", variation, added);
                    }
                    Err(e) => warn!("变体 \"{}\" 搜索失败: {}", variation, e),
                }
                self.pacing.variant.pause().await;
            }
        }

        // 3. 剧场列表中匹配的条目
        let catalog = self.collector.all_with_variation(1).await;
        let matched = set.extend(
            catalog
                .into_iter()
                .filter(|r| r.mentions(keyword))
                .map(|r| r.with_source("latest-match")),
        );
        debug!("剧场匹配: 新增 {} 条", matched);

        // 4. 结果不足时用子串补充, 只收录与原关键词相关的条目
        if set.len() < SUBSTRING_THRESHOLD && length >= 2 {
            let substrings = generate_substrings(keyword);
            for substring in substrings.iter().take(MAX_SUBSTRINGS) {
                match self.source.search(substring).await {
                    Ok(records) => {
                        let tag = format!("substring-{}", substring);
                        let added = set.extend(
                            records
                                .into_iter()
                                .filter(|r| r.mentions(keyword))
                                .map(|r| r.with_source(tag.as_str())),
                        );
                        debug!("子串 {}: 新增 {} 条", substring, added);
                    }
                    Err(e) => warn!("子串 \"{}\" 搜索失败: {}", substring, e),
                }
                self.pacing.variant.pause().await;
            }
        }

        if !direct_ok && set.is_empty() {
            warn!("增强搜索全部失败, 退回普通搜索: \"{}\"", keyword);
            return self.direct(keyword).await;
        }

        let results = sort_by_relevance(set.into_vec(), keyword);
        info!("🎉 增强搜索完成: \"{}\" 共 {} 条", keyword, results.len());
        Ok(results)
    }

    /// 增强搜索结果分页
    pub async fn paginated(
        &self,
        keyword: &str,
        page: usize,
        limit: usize,
    ) -> Result<SearchPage, UpstreamError> {
        let results = self.enhanced(keyword).await?;
        Ok(paginate(results, page, limit))
    }
}

/// 生成短关键词的变体
///
/// 单字母: 与常用字母前后组合, 再加上包含该字母的短词;
/// 双字母: 前后各拼一个字母。
pub fn generate_variations(keyword: &str, tables: &KeywordTables) -> Vec<String> {
    let mut variations = Vec::new();
    let lower = keyword.to_lowercase();

    match keyword.chars().count() {
        1 => {
            for letter in &tables.popular_letters {
                if letter.as_str() != keyword {
                    variations.push(format!("{}{}", keyword, letter));
                    variations.push(format!("{}{}", letter, keyword));
                }
            }
            for word in &tables.short_words {
                if word.contains(&lower) {
                    variations.push(word.clone());
                }
            }
        }
        2 => {
            for letter in &tables.affix_letters {
                variations.push(format!("{}{}", keyword, letter));
                variations.push(format!("{}{}", letter, keyword));
            }
        }
        _ => {}
    }

    variations
}

/// 生成关键词的真前缀和真后缀 (交替排列, 去重)
pub fn generate_substrings(keyword: &str) -> Vec<String> {
    let chars: Vec<char> = keyword.chars().collect();
    let mut substrings: Vec<String> = Vec::new();

    for i in 1..chars.len() {
        for candidate in [chars[..i].iter().collect::<String>(), chars[i..].iter().collect()] {
            if !substrings.contains(&candidate) {
                substrings.push(candidate);
            }
        }
    }

    substrings
}

/// 相关度分数: 标题开头 +10, 标题包含 +5, 类型包含 +3, 再加 rating * 0.1
pub fn relevance_score(record: &MovieRecord, keyword: &str) -> f64 {
    let keyword = keyword.to_lowercase();
    let title = record.title.to_lowercase();
    let mut score = 0.0;

    if title.starts_with(&keyword) {
        score += 10.0;
    }
    if title.contains(&keyword) {
        score += 5.0;
    }
    if record.genre.to_lowercase().contains(&keyword) {
        score += 3.0;
    }
    score + record.rating * 0.1
}

/// 按相关度降序排序, 同分保持原插入顺序
pub fn sort_by_relevance(records: Vec<MovieRecord>, keyword: &str) -> Vec<MovieRecord> {
    let mut scored: Vec<(f64, MovieRecord)> = records
        .into_iter()
        .map(|r| (relevance_score(&r, keyword), r))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, r)| r).collect()
}

/// 按 `(page-1)*limit .. page*limit` 切片, page 和 limit 至少为 1
pub fn paginate(results: Vec<MovieRecord>, page: usize, limit: usize) -> SearchPage {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = results.len();
    let start = (page - 1).saturating_mul(limit);
    let end = start.saturating_add(limit);

    let page_results = results
        .into_iter()
        .skip(start)
        .take(limit)
        .collect();

    SearchPage {
        results: page_results,
        current_page: page,
        total_results: total,
        total_pages: total.div_ceil(limit),
        has_more: end < total,
    }
}
