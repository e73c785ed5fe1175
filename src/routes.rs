//! HTTP 路由
//! API 挂在 /api 下, 其余路径交给前端静态目录, 找不到时返回入口页面

use crate::core::Collector;
use crate::error::ApiError;
use crate::search::SearchEngine;
use crate::stream::resolve_stream;
use crate::tables::KeywordTables;
use crate::throttle::Pacing;
use crate::upstream::DramaSource;
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    handler::HandlerWithoutStateExt,
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// 每次请求共享的服务
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DramaSource>,
    pub collector: Collector,
    pub search: SearchEngine,
}

impl AppState {
    pub fn new(source: Arc<dyn DramaSource>, tables: Arc<KeywordTables>, pacing: Pacing) -> Self {
        let collector = Collector::new(source.clone(), tables.clone(), pacing);
        let search = SearchEngine::new(source.clone(), collector.clone(), tables, pacing);
        Self {
            source,
            collector,
            search,
        }
    }
}

/// 完整应用: /health + /api + 前端
pub fn app(state: AppState, static_dir: &FsPath) -> Router {
    // CORS 配置
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let index_file = static_dir.join("index.html");
    let spa_fallback = move || {
        let index_file = index_file.clone();
        async move {
            match tokio::fs::read_to_string(&index_file).await {
                Ok(html) => Html(html).into_response(),
                Err(_) => Html(INDEX_HTML).into_response(),
            }
        }
    };
    let frontend = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(spa_fallback.into_service());

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router(state))
        .fallback_service(frontend)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/latest", get(latest_handler))
        .route("/latest/", get(latest_handler))
        .route("/latest/{page}", get(latest_page_handler))
        .route("/search", post(search_handler))
        .route("/search-enhanced", post(search_enhanced_handler))
        .route("/stream", post(stream_handler))
        .route("/all-movies", get(all_movies_handler))
        .route("/comprehensive-dramas", get(comprehensive_handler))
        .route("/dramas-by-genre/{genre}", get(genre_handler))
        .fallback(api_not_found)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    #[serde(default)]
    pub enhanced: bool,
}

#[derive(Debug, Deserialize)]
pub struct EnhancedSearchRequest {
    pub keyword: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    #[serde(rename = "bookId")]
    pub book_id: Option<Value>,
    pub index: Option<Value>,
}

/// 页码解析, 缺失、非数字或 0 都视为第 1 页
fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

/// 校验搜索关键词并去掉首尾空白
fn require_keyword(keyword: Option<String>) -> Result<String, ApiError> {
    let keyword = keyword.ok_or(ApiError::KeywordMissing)?;
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(ApiError::KeywordEmpty);
    }
    Ok(trimmed.to_string())
}

fn book_id_of(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn episode_of(value: Option<Value>) -> Option<u32> {
    let index = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    u32::try_from(index).ok().filter(|i| *i > 0)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!("请求体解析失败: {}", e);
        ApiError::InvalidBody
    })
}

/// 健康检查
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /api/latest?page=N
async fn latest_handler(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    latest(&state, parse_page(query.page.as_deref())).await
}

/// GET /api/latest/{page}
async fn latest_page_handler(State(state): State<AppState>, Path(page): Path<String>) -> Response {
    latest(&state, parse_page(Some(&page))).await
}

async fn latest(state: &AppState, page: u32) -> Response {
    let movies = state.collector.latest(page).await;
    info!("最新列表 第 {} 页: {} 条", page, movies.len());
    Json(movies).into_response()
}

/// POST /api/search
async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = json_body(payload)?;
    let keyword = require_keyword(req.keyword)?;

    info!(
        "🔍 搜索: \"{}\" ({} 个字符, 增强: {})",
        keyword,
        keyword.chars().count(),
        req.enhanced
    );

    let result = if req.enhanced {
        state.search.enhanced(&keyword).await
    } else {
        state.search.direct(&keyword).await
    };

    match result {
        Ok(movies) => {
            info!("✅ \"{}\" 找到 {} 条", keyword, movies.len());
            Ok(Json(movies).into_response())
        }
        Err(e) => {
            warn!("搜索失败 \"{}\": {}", keyword, e);
            Err(ApiError::SearchFailed)
        }
    }
}

/// POST /api/search-enhanced
async fn search_enhanced_handler(
    State(state): State<AppState>,
    payload: Result<Json<EnhancedSearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = json_body(payload)?;
    let keyword = require_keyword(req.keyword)?;
    let page = req.page.unwrap_or(1);
    let limit = req.limit.unwrap_or(50);

    info!("🚀 增强搜索: \"{}\" 第 {} 页, 每页 {}", keyword, page, limit);

    match state.search.paginated(&keyword, page, limit).await {
        Ok(result) => {
            info!(
                "✅ 增强搜索结果: 共 {} 条, 本页 {} 条",
                result.total_results,
                result.results.len()
            );
            Ok(Json(result).into_response())
        }
        Err(e) => {
            warn!("增强搜索失败 \"{}\": {}", keyword, e);
            Err(ApiError::EnhancedSearchFailed)
        }
    }
}

/// POST /api/stream
async fn stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<StreamRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = json_body(payload)?;
    let (book_id, episode) = match (book_id_of(req.book_id), episode_of(req.index)) {
        (Some(book_id), Some(episode)) => (book_id, episode),
        _ => return Err(ApiError::StreamParamsMissing),
    };

    let info = resolve_stream(state.source.as_ref(), &book_id, episode).await?;
    Ok(Json(info).into_response())
}

/// GET /api/all-movies?page=N
async fn all_movies_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = parse_page(query.page.as_deref());
    let movies = state.collector.all_with_variation(page).await;
    info!("全部影片 第 {} 页: {} 条", page, movies.len());

    Json(json!({
        "currentPage": page,
        "hasMore": movies.len() >= 15,
        "totalLoaded": movies.len(),
        "strategy": "variation",
        "movies": movies,
    }))
}

/// GET /api/comprehensive-dramas
async fn comprehensive_handler(State(state): State<AppState>) -> impl IntoResponse {
    let collection = state.collector.comprehensive().await;

    Json(json!({
        "totalCount": collection.dramas.len(),
        "strategy": "comprehensive",
        "sources": collection.stats,
        "dramas": collection.dramas,
    }))
}

/// GET /api/dramas-by-genre/{genre}
async fn genre_handler(State(state): State<AppState>, Path(genre): Path<String>) -> impl IntoResponse {
    let dramas = state.collector.by_genre(&genre).await;

    Json(json!({
        "genre": genre,
        "count": dramas.len(),
        "dramas": dramas,
    }))
}

/// /api 下未匹配的路径
async fn api_not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": ApiError::EndpointNotFound.to_string(),
            "path": uri.path(),
        })),
    )
}

/// 静态目录没有 index.html 时使用的入口页面
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>DramaYuk</title>
  <style>
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #111; color: #eee; margin: 0; padding: 20px; }
    .container { max-width: 1000px; margin: 0 auto; }
    form { display: flex; gap: 8px; margin-bottom: 20px; }
    input { flex: 1; padding: 12px; border-radius: 8px; border: none; }
    button { padding: 12px 20px; border-radius: 8px; border: none; background: #e50914; color: #fff; cursor: pointer; }
    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(150px, 1fr)); gap: 12px; }
    .card img { width: 100%; border-radius: 6px; }
    .card p { font-size: 14px; margin: 6px 0; }
  </style>
</head>
<body>
  <div class="container">
    <h1>DramaYuk</h1>
    <form id="search">
      <input id="keyword" type="text" placeholder="Cari drama...">
      <button type="submit">Cari</button>
    </form>
    <div id="list" class="grid"></div>
  </div>
  <script>
    const list = document.getElementById('list');
    function render(movies) {
      list.innerHTML = movies.map(m => `
        <div class="card">
          <img src="${m.poster}" alt="">
          <p>${m.title}</p>
        </div>`).join('');
    }
    fetch('/api/latest').then(r => r.json()).then(render);
    document.getElementById('search').addEventListener('submit', async (e) => {
      e.preventDefault();
      const keyword = document.getElementById('keyword').value;
      const res = await fetch('/api/search-enhanced', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ keyword })
      });
      const data = await res.json();
      render(data.results || []);
    });
  </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{suggest, theater, FakeSource};
    use crate::types::{CdnEntry, Chapter, ChapterBatch, VideoPath};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(source: FakeSource) -> Router {
        let state = AppState::new(
            Arc::new(source),
            Arc::new(KeywordTables::default()),
            Pacing::none(),
        );
        app(state, FsPath::new("/nonexistent/dramayuk-static"))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }

    #[test]
    fn test_stream_params() {
        assert_eq!(book_id_of(Some(json!("41000"))), Some("41000".to_string()));
        assert_eq!(book_id_of(Some(json!(41000))), Some("41000".to_string()));
        assert_eq!(book_id_of(Some(json!(""))), None);
        assert_eq!(episode_of(Some(json!(2))), Some(2));
        assert_eq!(episode_of(Some(json!("4"))), Some(4));
        assert_eq!(episode_of(Some(json!(0))), None);
        assert_eq!(episode_of(None), None);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(test_app(FakeSource::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());

        let (status, _) = get_json(test_app(FakeSource::new()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_blank_keyword() {
        let (status, body) =
            post_json(test_app(FakeSource::new()), "/api/search", json!({ "keyword": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Keyword tidak boleh kosong");

        let (status, body) =
            post_json(test_app(FakeSource::new()), "/api/search", json!({ "keyword": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Keyword tidak boleh kosong");
    }

    #[tokio::test]
    async fn test_search_missing_keyword() {
        let source = FakeSource::new();
        let (status, body) = post_json(test_app(source), "/api/search", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Keyword diperlukan");
    }

    #[tokio::test]
    async fn test_search_invalid_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(test_app(FakeSource::new()), request).await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_direct() {
        let source = FakeSource::new().with_search("ceo", vec![suggest("1", "The CEO", &[], 0.0)]);
        let (status, body) =
            post_json(test_app(source), "/api/search", json!({ "keyword": " ceo " })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["bookId"], "1");
    }

    #[tokio::test]
    async fn test_search_upstream_failure() {
        let (status, body) =
            post_json(test_app(FakeSource::down()), "/api/search", json!({ "keyword": "ceo" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Gagal mencari film");
    }

    #[tokio::test]
    async fn test_search_enhanced_flag() {
        let source = FakeSource::new().with_search("ceo", vec![suggest("1", "The CEO", &[], 0.0)]);
        let (status, body) = post_json(
            test_app(source),
            "/api/search",
            json!({ "keyword": "ceo", "enhanced": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["source"], "direct");
    }

    #[tokio::test]
    async fn test_search_enhanced_pagination() {
        let records: Vec<_> = (0..60).map(|i| suggest(&i.to_string(), "Love", &[], 0.0)).collect();
        let source = FakeSource::new().with_search("love", records);
        let (status, body) =
            post_json(test_app(source), "/api/search-enhanced", json!({ "keyword": "love" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentPage"], 1);
        assert_eq!(body["totalResults"], 60);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["hasMore"], true);
        assert_eq!(body["results"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_search_enhanced_total_failure() {
        let (status, body) = post_json(
            test_app(FakeSource::down()),
            "/api/search-enhanced",
            json!({ "keyword": "love", "page": 1, "limit": 10 }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Gagal melakukan enhanced search");
    }

    #[tokio::test]
    async fn test_stream_requires_params() {
        let (status, body) =
            post_json(test_app(FakeSource::new()), "/api/stream", json!({ "bookId": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bookId dan index diperlukan");
    }

    #[tokio::test]
    async fn test_stream_selects_540() {
        let batch = ChapterBatch {
            chapter_list: vec![Chapter {
                cdn_list: vec![CdnEntry {
                    cdn_domain: Some("cdn.example.com".to_string()),
                    video_path_list: vec![
                        VideoPath {
                            quality: Some(540),
                            video_path: "https://cdn.example.com/540.mp4".to_string(),
                            is_default: Some(0),
                        },
                        VideoPath {
                            quality: Some(360),
                            video_path: "https://cdn.example.com/360.mp4".to_string(),
                            is_default: Some(0),
                        },
                    ],
                }],
            }],
        };
        let source = FakeSource::new().with_chapters(batch);
        let (status, body) = post_json(
            test_app(source),
            "/api/stream",
            json!({ "bookId": "x", "index": 2 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://cdn.example.com/540.mp4");
        assert_eq!(body["episodeNumber"], 2);
        assert_eq!(body["title"], "Episode 2");
        assert_eq!(body["cdnDomain"], "cdn.example.com");
    }

    #[tokio::test]
    async fn test_stream_not_found() {
        let (status, body) = post_json(
            test_app(FakeSource::new()),
            "/api/stream",
            json!({ "bookId": "x", "index": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Link streaming tidak ditemukan");
    }

    #[tokio::test]
    async fn test_latest_routes() {
        let source = FakeSource::new().with_theater(43, 2, 2, vec![theater("5", "Page Two", &[], "")]);
        let app = test_app(source);

        let (status, body) = get_json(app.clone(), "/api/latest/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["bookId"], "5");

        let (_, body) = get_json(app.clone(), "/api/latest?page=2").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = get_json(app, "/api/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_trailing_slash_is_first_page() {
        let source = FakeSource::new().with_theater(43, 1, 1, vec![theater("1", "Page One", &[], "")]);
        let (status, body) = get_json(test_app(source), "/api/latest/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["bookId"], "1");
    }

    #[tokio::test]
    async fn test_all_movies() {
        let source = FakeSource::new().with_theater_default(vec![theater("1", "Same", &[], "")]);
        let (status, body) = get_json(test_app(source), "/api/all-movies?page=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalLoaded"], 1);
        assert_eq!(body["hasMore"], false);
        assert_eq!(body["strategy"], "variation");
        assert_eq!(body["currentPage"], 1);
    }

    #[tokio::test]
    async fn test_comprehensive_dramas() {
        let source = FakeSource::new()
            .with_theater(43, 1, 1, vec![theater("1", "T", &[], "")])
            .with_search("ceo", vec![suggest("2", "CEO", &[], 0.0)])
            .with_theater(47, 1, 1, vec![theater("3", "C", &[], "")]);
        let (status, body) = get_json(test_app(source), "/api/comprehensive-dramas").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCount"], 3);
        assert_eq!(body["strategy"], "comprehensive");
        assert_eq!(body["sources"], json!({ "theater": 1, "search": 1, "channels": 1 }));
    }

    #[tokio::test]
    async fn test_dramas_by_genre() {
        let source = FakeSource::new().with_search(
            "comedy",
            vec![suggest("1", "Funny", &["Comedy"], 0.0), suggest("2", "Sad", &["Drama"], 0.0)],
        );
        let (status, body) = get_json(test_app(source), "/api/dramas-by-genre/comedy").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["genre"], "comedy");
        assert_eq!(body["count"], 1);
        assert_eq!(body["dramas"][0]["bookId"], "1");
    }

    #[tokio::test]
    async fn test_unknown_api_path() {
        let (status, body) = get_json(test_app(FakeSource::new()), "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "API endpoint tidak ditemukan");
        assert_eq!(body["path"], "/api/nope");
    }

    #[tokio::test]
    async fn test_unknown_page_serves_entry_document() {
        let request = Request::builder().uri("/drama/123").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(FakeSource::new()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("DramaYuk"));
    }

    #[tokio::test]
    async fn test_unknown_page_any_method_serves_entry_document() {
        let request = Request::builder()
            .method("POST")
            .uri("/drama/1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(FakeSource::new()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("DramaYuk"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/search")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = test_app(FakeSource::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
