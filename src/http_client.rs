use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// DramaBox 安卓客户端使用的 UA
const USER_AGENT: &str = "okhttp/4.10.0";

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("请求超时")]
    Timeout,
    #[error("请求失败: {0}")]
    RequestFailed(String),
    #[error("响应异常状态码: {0}")]
    BadStatus(u16),
    #[error("响应解析失败: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpClientError::Timeout
        } else if e.is_decode() {
            HttpClientError::Decode(e.to_string())
        } else {
            HttpClientError::RequestFailed(e.to_string())
        }
    }
}

/// 构建上游 HTTP 客户端
pub fn build_client(timeout: Duration) -> Result<Client, HttpClientError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| HttpClientError::RequestFailed(e.to_string()))
}

fn ensure_success(response: Response) -> Result<Response, HttpClientError> {
    if !response.status().is_success() {
        return Err(HttpClientError::BadStatus(response.status().as_u16()));
    }
    Ok(response)
}

/// GET 请求并返回 JSON
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, HttpClientError> {
    let response = client.get(url).send().await?;
    let response = ensure_success(response)?;
    response
        .json()
        .await
        .map_err(|e| HttpClientError::Decode(e.to_string()))
}

/// POST 请求 (JSON body) 并返回 JSON
pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: &B,
    headers: HeaderMap,
) -> Result<T, HttpClientError> {
    let response = client.post(url).headers(headers).json(body).send().await?;
    let response = ensure_success(response)?;
    response
        .json()
        .await
        .map_err(|e| HttpClientError::Decode(e.to_string()))
}
