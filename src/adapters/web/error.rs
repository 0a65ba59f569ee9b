//! JSON error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::TradereviewError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<TradereviewError> for WebError {
    fn from(err: TradereviewError) -> Self {
        let status = match &err {
            TradereviewError::NoData { .. } => StatusCode::NOT_FOUND,
            TradereviewError::ConfigParse { .. }
            | TradereviewError::ConfigMissing { .. }
            | TradereviewError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
            TradereviewError::Fetch { .. } => StatusCode::CONFLICT,
            TradereviewError::BarStore { .. }
            | TradereviewError::TransactionLog { .. }
            | TradereviewError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
