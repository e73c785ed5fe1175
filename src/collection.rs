//! 按 bookId 去重的有序结果集
//! 先插入者保留, 之后同 id 的记录直接丢弃, 已插入的记录不再修改

use crate::types::MovieRecord;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct MovieSet {
    seen: HashSet<String>,
    records: Vec<MovieRecord>,
}

impl MovieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅当 bookId 不存在时插入, 返回是否插入
    pub fn insert_if_absent(&mut self, record: MovieRecord) -> bool {
        if self.seen.contains(&record.book_id) {
            return false;
        }
        self.seen.insert(record.book_id.clone());
        self.records.push(record);
        true
    }

    /// 批量插入, 返回新增数量
    pub fn extend<I: IntoIterator<Item = MovieRecord>>(&mut self, records: I) -> usize {
        let mut added = 0;
        for record in records {
            if self.insert_if_absent(record) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按插入顺序返回
    pub fn into_vec(self) -> Vec<MovieRecord> {
        self.records
    }
}

impl FromIterator<MovieRecord> for MovieSet {
    fn from_iter<I: IntoIterator<Item = MovieRecord>>(iter: I) -> Self {
        let mut set = MovieSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordDefaults, SuggestRecord};

    fn record(id: &str, title: &str) -> MovieRecord {
        let raw: SuggestRecord = serde_json::from_value(serde_json::json!({
            "bookId": id,
            "bookName": title,
        }))
        .unwrap();
        MovieRecord::from_suggest(raw, &RecordDefaults::default())
    }

    #[test]
    fn test_first_seen_wins() {
        let mut set = MovieSet::new();
        assert!(set.insert_if_absent(record("1", "first").with_source("direct")));
        assert!(!set.insert_if_absent(record("1", "second").with_source("latest-match")));

        let records = set.into_vec();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "first");
        assert_eq!(records[0].source.as_deref(), Some("direct"));
    }

    #[test]
    fn test_keeps_insertion_order() {
        let set: MovieSet = vec![record("3", "c"), record("1", "a"), record("3", "x"), record("2", "b")]
            .into_iter()
            .collect();

        let ids: Vec<_> = set.into_vec().into_iter().map(|r| r.book_id).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_extend_counts_new_only() {
        let mut set = MovieSet::new();
        assert_eq!(set.extend(vec![record("1", "a"), record("2", "b")]), 2);
        assert_eq!(set.extend(vec![record("2", "b"), record("3", "c"), record("3", "c")]), 1);
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }
}
