//! 核心聚合逻辑
//! 变体分页抓取、全量收集、按类型收集; 上游调用顺序执行并按固定间隔节流

use crate::collection::MovieSet;
use crate::tables::KeywordTables;
use crate::throttle::Pacing;
use crate::types::MovieRecord;
use crate::upstream::DramaSource;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 全量收集结果, 附带各阶段新增数量
#[derive(Debug)]
pub struct Collection {
    pub dramas: Vec<MovieRecord>,
    pub stats: CollectionStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub theater: usize,
    pub search: usize,
    pub channels: usize,
}

#[derive(Clone)]
pub struct Collector {
    source: Arc<dyn DramaSource>,
    tables: Arc<KeywordTables>,
    pacing: Pacing,
}

impl Collector {
    pub fn new(source: Arc<dyn DramaSource>, tables: Arc<KeywordTables>, pacing: Pacing) -> Self {
        Self {
            source,
            tables,
            pacing,
        }
    }

    /// 默认频道的最新列表 (pageNo 与 index 同为 page)
    pub async fn latest(&self, page: u32) -> Vec<MovieRecord> {
        self.channel_page(self.tables.default_channel, page, page).await
    }

    /// 单次剧场查询, 失败记录日志并返回空列表
    pub async fn channel_page(&self, channel_id: u32, page: u32, index: u32) -> Vec<MovieRecord> {
        match self.source.theater_page(channel_id, page, index).await {
            Ok(records) => records,
            Err(e) => {
                warn!("频道 {} 第 {} 页 (index {}) 获取失败: {}", channel_id, page, index, e);
                Vec::new()
            }
        }
    }

    /// 按 (页偏移 × index) 网格查询默认频道并按 bookId 去重
    pub async fn all_with_variation(&self, page: u32) -> Vec<MovieRecord> {
        let channel = self.tables.default_channel;
        let mut set = MovieSet::new();
        let mut total = 0;

        for offset in &self.tables.page_offsets {
            for index in &self.tables.indexes {
                let page_no = page.saturating_add(*offset);
                let records = self.channel_page(channel, page_no, *index).await;
                total += records.len();
                set.extend(records);
            }
        }

        info!("变体抓取 第 {} 页: {} 条, 去重后 {} 条", page, total, set.len());
        set.into_vec()
    }

    /// 全量收集: 变体抓取 + 关键词扫描 + 频道扫描
    pub async fn comprehensive(&self) -> Collection {
        info!("🚀 开始全量收集");
        let mut set = MovieSet::new();
        let mut stats = CollectionStats::default();

        let theater = self.all_with_variation(1).await;
        stats.theater = set.extend(theater.into_iter().map(|r| r.with_source("theater")));
        info!("📺 剧场: {} 条", stats.theater);

        for keyword in &self.tables.collection_keywords {
            match self.source.search(keyword).await {
                Ok(records) => {
                    let added = set.extend(
                        records
                            .into_iter()
                            .map(|r| r.with_source("search").with_keyword(keyword.as_str())),
                    );
                    debug!("关键词 {}: 新增 {} 条", keyword, added);
                    stats.search += added;
                }
                Err(e) => warn!("❌ 关键词 \"{}\" 搜索失败: {}", keyword, e),
            }
            self.pacing.keyword.pause().await;
        }
        info!("🔍 搜索: 新增 {} 条", stats.search);

        for channel_id in &self.tables.collection_channels {
            match self.source.theater_page(*channel_id, 1, 1).await {
                Ok(records) => {
                    let tag = format!("channel-{}", channel_id);
                    stats.channels +=
                        set.extend(records.into_iter().map(|r| r.with_source(tag.as_str())));
                }
                Err(e) => warn!("❌ 频道 {} 获取失败: {}", channel_id, e),
            }
            self.pacing.channel.pause().await;
        }
        info!("📡 频道: 新增 {} 条", stats.channels);

        info!("🎉 全量收集完成: {} 条", set.len());
        Collection {
            dramas: set.into_vec(),
            stats,
        }
    }

    /// 用类型关键词搜索, 只保留 genre 包含该类型的结果
    pub async fn by_genre(&self, genre: &str) -> Vec<MovieRecord> {
        let genre_lower = genre.to_lowercase();
        let mut set = MovieSet::new();

        for keyword in self.tables.keywords_for_genre(genre) {
            match self.source.search(&keyword).await {
                Ok(records) => {
                    set.extend(
                        records
                            .into_iter()
                            .filter(|r| r.genre.to_lowercase().contains(&genre_lower)),
                    );
                }
                Err(e) => warn!("类型 {} 关键词 {} 搜索失败: {}", genre, keyword, e),
            }
            self.pacing.keyword.pause().await;
        }

        info!("🎭 类型 {}: {} 条", genre, set.len());
        set.into_vec()
    }
}
