use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::throttle::{Pacing, Throttle};

/// 从环境变量读取的服务配置
#[derive(Debug, Clone)]
pub struct Config {
    // 服务
    pub port: u16,
    pub static_dir: PathBuf,

    // 上游
    pub token_url: String,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    /// 0 表示每次调用都获取新令牌
    pub token_cache: Duration,

    // 节流
    pub keyword_delay_ms: u64,
    pub channel_delay_ms: u64,
    pub variant_delay_ms: u64,
}

impl Config {
    /// 读取环境变量, 缺失或非法时使用默认值
    pub fn from_env() -> Self {
        Self {
            port: parse_env("PORT", 3001),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("frontend")),

            token_url: env::var("TOKEN_URL")
                .unwrap_or_else(|_| "https://dramabox-token.vercel.app/token".to_string()),
            upstream_base_url: env::var("DRAMABOX_BASE_URL")
                .unwrap_or_else(|_| "https://sapi.dramaboxdb.com".to_string()),
            upstream_timeout: Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECS", 15)),
            token_cache: Duration::from_secs(parse_env("TOKEN_CACHE_SECS", 0)),

            keyword_delay_ms: parse_env("KEYWORD_DELAY_MS", 100),
            channel_delay_ms: parse_env("CHANNEL_DELAY_MS", 200),
            variant_delay_ms: parse_env("VARIANT_DELAY_MS", 200),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            keyword: Throttle::from_millis(self.keyword_delay_ms),
            channel: Throttle::from_millis(self.channel_delay_ms),
            variant: Throttle::from_millis(self.variant_delay_ms),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
