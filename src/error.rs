//! 对外错误
//! 统一返回 `{ "error": "<消息>" }`, 消息为印尼语

use crate::stream::StreamError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Keyword diperlukan")]
    KeywordMissing,
    #[error("Keyword tidak boleh kosong")]
    KeywordEmpty,
    #[error("bookId dan index diperlukan")]
    StreamParamsMissing,
    #[error("Format permintaan tidak valid")]
    InvalidBody,
    #[error("Gagal mencari film")]
    SearchFailed,
    #[error("Gagal melakukan enhanced search")]
    EnhancedSearchFailed,
    #[error("Link streaming tidak ditemukan")]
    StreamNotFound,
    #[error("Gagal mengambil link streaming")]
    StreamFailed,
    #[error("API endpoint tidak ditemukan")]
    EndpointNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::KeywordMissing
            | ApiError::KeywordEmpty
            | ApiError::StreamParamsMissing
            | ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::StreamNotFound | ApiError::EndpointNotFound => StatusCode::NOT_FOUND,
            ApiError::SearchFailed | ApiError::EnhancedSearchFailed | ApiError::StreamFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::NotFound => ApiError::StreamNotFound,
            StreamError::Failed => ApiError::StreamFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
