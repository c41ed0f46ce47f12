//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! # 構造化エラーレスポンス
//!
//! `GatewayError`は`status_code()`と`external_message()`を提供し、
//! クライアントが`statusType`で分岐できる安定した形のエラーボディを生成します。

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Configuration error
///
/// 起動時（およびレジストリ再読み込み時）にのみ発生する。
/// リクエスト処理中には発生しない。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Registry file could not be read
    #[error("Failed to read registry file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Registry file could not be parsed
    #[error("Failed to parse registry file {path}: {message}")]
    Parse {
        /// File path
        path: String,
        /// Parser message
        message: String,
    },

    /// Registry entry violates a load-time invariant
    #[error("Invalid registry entry {service}/{version}: {reason}")]
    InvalidEntry {
        /// Service name
        service: String,
        /// Service version
        version: String,
        /// Why the entry was rejected
        reason: String,
    },

    /// Listen address could not be parsed
    #[error("Invalid listen address: {0}")]
    ListenAddress(String),

    /// Flag store client could not be configured
    #[error("Invalid flag store address {0}")]
    FlagStore(String),

    /// Upstream HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Path has fewer than two segments
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Route key is not registered
    #[error("Service not found: {service}/{version}")]
    ServiceNotFound {
        /// Service name
        service: String,
        /// Service version
        version: String,
    },

    /// Registry yielded no usable endpoint
    #[error("No endpoint available for {service}/{version}")]
    NoEndpointAvailable {
        /// Service name
        service: String,
        /// Service version
        version: String,
    },

    /// Flag store could not be reached or answered garbage
    #[error("Flag store unavailable: {0}")]
    FlagStoreUnavailable(String),

    /// Endpoint + downstream path is not a valid URL
    #[error("Invalid target URL {url}: {reason}")]
    InvalidTargetUrl {
        /// The combined URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// Upstream connection or transfer failed
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Upstream did not answer in time
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Inbound body could not be read
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl GatewayError {
    /// Returns a safe error message for external clients.
    ///
    /// アドレスや内部原因はここに含めない。詳細は`Display`でログにのみ出力する。
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid path",
            Self::ServiceNotFound { .. } => "service name/version not found",
            Self::NoEndpointAvailable { .. } => "service name/version not found",
            Self::FlagStoreUnavailable(_) => "flag store unavailable",
            Self::InvalidTargetUrl { .. } => "invalid target url",
            Self::UpstreamUnreachable(_) => "upstream unreachable",
            Self::UpstreamTimeout(_) => "upstream timeout",
            Self::InvalidBody(_) => "invalid request body",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::ServiceNotFound { .. } => StatusCode::BAD_REQUEST,
            Self::NoEndpointAvailable { .. } => StatusCode::BAD_REQUEST,
            Self::FlagStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidTargetUrl { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Converts this error to the structured client error body.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody::error(self.external_message())
    }
}

/// 構造化エラーレスポンス
///
/// # Example
///
/// ```json
/// {
///   "status": {
///     "statusType": "ERROR",
///     "statusMessage": "service name/version not found"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Status envelope
    pub status: StatusDetail,
}

impl ErrorBody {
    /// `statusType: ERROR`のボディを作成
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: StatusDetail {
                status_type: "ERROR".to_string(),
                status_message: message.into(),
            },
        }
    }
}

/// ステータス詳細
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetail {
    /// Always `ERROR` for error responses
    pub status_type: String,
    /// Human-readable message
    pub status_message: String,
}

/// Result type alias (gateway)
pub type GatewayResult<T> = Result<T, GatewayError>;
