//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use crate::common::error::GatewayError;
use axum::{response::IntoResponse, Json};

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub GatewayError);

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Use external_message() to avoid exposing internal details (addresses, causes).
        // Full error details are logged by the handler.
        (self.0.status_code(), Json(self.0.to_error_body())).into_response()
    }
}
