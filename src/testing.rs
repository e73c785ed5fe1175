//! 测试用内存数据源

use crate::http_client::HttpClientError;
use crate::types::{ChapterBatch, MovieRecord, RecordDefaults, SuggestRecord, TheaterRecord};
use crate::upstream::{DramaSource, UpstreamError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// 记录每次调用, 按预设返回结果; 未预设的调用返回空列表
#[derive(Default)]
pub struct FakeSource {
    pub theater: HashMap<(u32, u32, u32), Vec<MovieRecord>>,
    pub theater_default: Vec<MovieRecord>,
    pub search: HashMap<String, Vec<MovieRecord>>,
    pub failing_keywords: HashSet<String>,
    pub failing_theater: HashSet<(u32, u32, u32)>,
    pub fail_all: bool,
    pub chapters: Option<ChapterBatch>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn down() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, keyword: &str, records: Vec<MovieRecord>) -> Self {
        self.search.insert(keyword.to_string(), records);
        self
    }

    pub fn failing_search(mut self, keyword: &str) -> Self {
        self.failing_keywords.insert(keyword.to_string());
        self
    }

    pub fn with_theater(mut self, channel: u32, page: u32, index: u32, records: Vec<MovieRecord>) -> Self {
        self.theater.insert((channel, page, index), records);
        self
    }

    pub fn failing_theater(mut self, channel: u32, page: u32, index: u32) -> Self {
        self.failing_theater.insert((channel, page, index));
        self
    }

    pub fn with_theater_default(mut self, records: Vec<MovieRecord>) -> Self {
        self.theater_default = records;
        self
    }

    pub fn with_chapters(mut self, batch: ChapterBatch) -> Self {
        self.chapters = Some(batch);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn offline() -> UpstreamError {
    UpstreamError::Token(HttpClientError::RequestFailed("offline".to_string()))
}

#[async_trait]
impl DramaSource for FakeSource {
    async fn theater_page(
        &self,
        channel_id: u32,
        page: u32,
        index: u32,
    ) -> Result<Vec<MovieRecord>, UpstreamError> {
        self.log(format!("theater:{}:{}:{}", channel_id, page, index));
        let key = (channel_id, page, index);
        if self.fail_all || self.failing_theater.contains(&key) {
            return Err(offline());
        }
        Ok(self
            .theater
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.theater_default.clone()))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<MovieRecord>, UpstreamError> {
        self.log(format!("search:{}", keyword));
        if self.fail_all || self.failing_keywords.contains(keyword) {
            return Err(offline());
        }
        Ok(self.search.get(keyword).cloned().unwrap_or_default())
    }

    async fn chapters(&self, book_id: &str, index: u32) -> Result<ChapterBatch, UpstreamError> {
        self.log(format!("chapters:{}:{}", book_id, index));
        if self.fail_all {
            return Err(offline());
        }
        Ok(self.chapters.clone().unwrap_or_default())
    }
}

/// 搜索接口形态的记录
pub fn suggest(id: &str, title: &str, tags: &[&str], score: f64) -> MovieRecord {
    let raw: SuggestRecord = serde_json::from_value(serde_json::json!({
        "bookId": id,
        "bookName": title,
        "introduction": "",
        "tagNames": tags,
        "score": score,
    }))
    .unwrap();
    MovieRecord::from_suggest(raw, &RecordDefaults::default())
}

/// 剧场接口形态的记录
pub fn theater(id: &str, title: &str, tags: &[&str], description: &str) -> MovieRecord {
    let raw: TheaterRecord = serde_json::from_value(serde_json::json!({
        "bookId": id,
        "bookName": title,
        "introduction": description,
        "tags": tags,
        "chapterCount": 60,
    }))
    .unwrap();
    MovieRecord::from_theater(raw, 43, "p1_i1_c43".to_string(), &RecordDefaults::default())
}
