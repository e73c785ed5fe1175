mod collection;
mod config;
mod core;
mod error;
mod http_client;
mod routes;
mod search;
mod stream;
mod tables;
#[cfg(test)]
mod testing;
mod throttle;
mod token;
mod types;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::http_client::build_client;
use crate::routes::AppState;
use crate::tables::KeywordTables;
use crate::token::{CachedTokenProvider, HttpTokenProvider, TokenProvider};
use crate::types::RecordDefaults;
use crate::upstream::{DramaBoxClient, DramaSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 初始化日志
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = Config::from_env();
    let client = build_client(config.upstream_timeout)?;

    // 令牌: 默认每次调用都重新获取
    let mut tokens: Arc<dyn TokenProvider> =
        Arc::new(HttpTokenProvider::new(client.clone(), config.token_url.as_str()));
    if !config.token_cache.is_zero() {
        info!("🔑 令牌缓存 {} 秒", config.token_cache.as_secs());
        tokens = Arc::new(CachedTokenProvider::new(tokens, config.token_cache));
    }

    let source: Arc<dyn DramaSource> = Arc::new(DramaBoxClient::new(
        client,
        config.upstream_base_url.as_str(),
        tokens,
        RecordDefaults::default(),
    ));
    let pacing = config.pacing();
    info!(
        "⏱️ 节流间隔: 关键词 {:?}, 频道 {:?}, 变体 {:?}",
        pacing.keyword.interval(),
        pacing.channel.interval(),
        pacing.variant.interval()
    );
    let state = AppState::new(source, Arc::new(KeywordTables::default()), pacing);
    let app = routes::app(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("🚀 DramaYuk API 启动在 http://{}", addr);
    info!("📁 前端目录: {}", config.static_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
