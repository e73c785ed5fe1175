//! 静态配置表
//! 关键词、频道、类型映射都是数据而不是代码, 注入到服务里便于测试替换

/// 默认剧场频道
pub const DEFAULT_CHANNEL: u32 = 43;

/// 全量收集时逐个扫描的搜索关键词 (顺序即请求顺序)
pub const COLLECTION_KEYWORDS: &[&str] = &[
    // 类型
    "romance", "drama", "comedy", "action", "thriller", "fantasy",
    "historical", "modern", "family", "school", "office", "medical",
    // 热门题材
    "love", "marriage", "ceo", "boss", "contract", "fake", "rich",
    "poor", "revenge", "secret", "hidden", "identity", "twin",
    "substitute", "arranged", "forced", "divorce", "ex", "husband",
    "wife", "pregnant", "baby", "child", "daughter", "son",
    // 常用词
    "the", "my", "his", "her", "our", "you", "me", "i", "we",
    "and", "or", "but", "with", "for", "to", "from", "in", "on",
    // 单字母
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
];

/// 全量收集时扫描的频道
pub const COLLECTION_CHANNELS: &[u32] = &[43, 44, 45, 46, 47, 48, 49, 50];

/// 类型 -> 相关关键词
pub const GENRE_KEYWORDS: &[(&str, &[&str])] = &[
    ("romance", &["romance", "love", "romantic", "dating", "marriage", "wedding", "couple"]),
    ("drama", &["drama", "family", "life", "story", "emotional", "tears"]),
    ("comedy", &["comedy", "funny", "humor", "laugh", "comic", "fun"]),
    ("action", &["action", "fight", "battle", "war", "combat", "hero"]),
    ("thriller", &["thriller", "suspense", "mystery", "crime", "detective"]),
    ("fantasy", &["fantasy", "magic", "supernatural", "fairy", "myth"]),
    ("historical", &["historical", "period", "ancient", "dynasty", "emperor"]),
    ("modern", &["modern", "contemporary", "current", "today", "now"]),
];

/// 单字母关键词的组合字母
pub const POPULAR_LETTERS: &[&str] = &["a", "e", "i", "o", "u", "n", "t", "s", "r", "l"];

/// 单字母关键词额外尝试的短词
pub const SHORT_WORDS: &[&str] = &["my", "me", "he", "we", "to", "in", "on", "at", "it", "is"];

/// 双字母关键词前后拼接的字母
pub const AFFIX_LETTERS: &[&str] = &["a", "e", "i", "o", "u", "n", "t", "s"];

/// 变体查询的页偏移和 index 网格
pub const VARIATION_PAGE_OFFSETS: &[u32] = &[0, 1, 2, 3];
pub const VARIATION_INDEXES: &[u32] = &[1, 2];

/// 注入服务的配置表
#[derive(Debug, Clone)]
pub struct KeywordTables {
    pub default_channel: u32,
    pub collection_keywords: Vec<String>,
    pub collection_channels: Vec<u32>,
    pub genre_keywords: Vec<(String, Vec<String>)>,
    pub popular_letters: Vec<String>,
    pub short_words: Vec<String>,
    pub affix_letters: Vec<String>,
    pub page_offsets: Vec<u32>,
    pub indexes: Vec<u32>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            default_channel: DEFAULT_CHANNEL,
            collection_keywords: to_owned(COLLECTION_KEYWORDS),
            collection_channels: COLLECTION_CHANNELS.to_vec(),
            genre_keywords: GENRE_KEYWORDS
                .iter()
                .map(|(genre, words)| (genre.to_string(), to_owned(words)))
                .collect(),
            popular_letters: to_owned(POPULAR_LETTERS),
            short_words: to_owned(SHORT_WORDS),
            affix_letters: to_owned(AFFIX_LETTERS),
            page_offsets: VARIATION_PAGE_OFFSETS.to_vec(),
            indexes: VARIATION_INDEXES.to_vec(),
        }
    }
}

impl KeywordTables {
    /// 类型对应的关键词, 未收录的类型直接用类型名本身
    pub fn keywords_for_genre(&self, genre: &str) -> Vec<String> {
        let genre = genre.to_lowercase();
        self.genre_keywords
            .iter()
            .find(|(name, _)| *name == genre)
            .map(|(_, words)| words.clone())
            .unwrap_or_else(|| vec![genre])
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
