//! 授权令牌获取
//! 默认每次上游调用都获取新令牌, 可选短时缓存

use crate::http_client::{get_json, HttpClientError};
use crate::types::AuthToken;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<AuthToken, HttpClientError>;
}

/// 从令牌服务 `GET {url}` 获取 `{token, deviceid}`
pub struct HttpTokenProvider {
    client: Client,
    url: String,
}

impl HttpTokenProvider {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> Result<AuthToken, HttpClientError> {
        debug!("获取令牌: {}", self.url);
        get_json(&self.client, &self.url).await.map_err(|e| {
            warn!("获取令牌失败: {}", e);
            e
        })
    }
}

/// 在 `ttl` 内复用同一个令牌
pub struct CachedTokenProvider {
    inner: Arc<dyn TokenProvider>,
    ttl: Duration,
    cached: Mutex<Option<(AuthToken, Instant)>>,
}

impl CachedTokenProvider {
    pub fn new(inner: Arc<dyn TokenProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for CachedTokenProvider {
    async fn fetch_token(&self) -> Result<AuthToken, HttpClientError> {
        let mut guard = self.cached.lock().await;
        if let Some((token, fetched_at)) = guard.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(token.clone());
            }
        }

        let token = self.inner.fetch_token().await?;
        *guard = Some((token.clone(), Instant::now()));
        Ok(token)
    }
}
