// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed request parameter.
    BadRequest(String),
    /// A store call failed; `context` is the operation-level message.
    Store { context: &'static str, source: StoreError },
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Store { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            AppError::Store { source: StoreError::NotFound { .. }, .. } => {
                (StatusCode::NOT_FOUND, json!({ "message": "Product not found" }))
            }
            AppError::Store { context, source } => {
                tracing::warn!(error = %source, "{context}");
                let mut body = json!({ "message": context, "error": source.to_string() });
                if let StoreError::Validation(v) = &source {
                    body["violations"] = json!(v.violations);
                }
                (StatusCode::BAD_REQUEST, body)
            }
        };

        (status, Json(body)).into_response()
    }
}
