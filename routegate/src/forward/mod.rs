//! 上流への転送
//!
//! 送信リクエスト（メソッド、フィルタ済みヘッダー、ボディ）を組み立て、
//! 共有の接続プール付きクライアントで送信し、上流レスポンスをそのまま返す。
//! リトライは行わない。

pub mod headers;
pub mod limiter;

pub use headers::filter_headers;
pub use limiter::HostLimiter;

use crate::common::error::{ConfigError, GatewayError};
use crate::config::UpstreamConfig;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::debug;

/// POST/PUT 送信時に強制するContent-Type
pub const NORMALIZED_CONTENT_TYPE: &str = "text/xml";

/// 上流レスポンス
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// ステータスコード
    pub status: StatusCode,
    /// Content-Type（上流が返した場合のみ）
    pub content_type: Option<HeaderValue>,
    /// ボディ
    pub body: Bytes,
}

/// 転送プロキシ
///
/// `Clone` はクライアントと接続制限を共有する。
#[derive(Debug, Clone)]
pub struct ForwardingProxy {
    client: reqwest::Client,
    limiter: HostLimiter,
    config: UpstreamConfig,
}

impl ForwardingProxy {
    /// 設定からクライアントを構築して作成
    pub fn new(config: UpstreamConfig) -> Result<Self, ConfigError> {
        let client = build_client(&config)?;
        Ok(Self::with_client(client, config))
    }

    /// 既存クライアントを使って作成
    pub fn with_client(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Self {
            client,
            limiter: HostLimiter::new(config.max_conns_per_host),
            config,
        }
    }

    /// 上流設定
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// 接続制限
    pub fn limiter(&self) -> &HostLimiter {
        &self.limiter
    }

    /// 送信リクエストを組み立てる
    ///
    /// - GET/DELETE: ボディなし
    /// - POST/PUT: 受信ボディをそのまま添付し、Content-Typeを `text/xml` に上書き
    /// - その他: ボディなし、ヘッダーはフィルタのみ
    pub fn build_request(
        &self,
        method: Method,
        url: Url,
        inbound_headers: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Request, GatewayError> {
        let mut headers = filter_headers(inbound_headers);

        let attach_body = method == Method::POST || method == Method::PUT;
        if attach_body {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(NORMALIZED_CONTENT_TYPE),
            );
        }

        let mut builder = self.client.request(method, url.clone()).headers(headers);
        if attach_body {
            builder = builder.body(body);
        }

        builder.build().map_err(|e| GatewayError::InvalidTargetUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// リクエストを上流へ転送する
    ///
    /// 接続枠の待ち時間と上流への送受信は、合わせて `config.timeout` に収める。
    /// 呼び出し元のタスクがキャンセルされると、送信中のリクエストもドロップされる。
    pub async fn forward(
        &self,
        method: Method,
        endpoint: &str,
        downstream_path: &str,
        inbound_headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, GatewayError> {
        let url = target_url(endpoint, downstream_path)?;
        let host = host_key(&url);
        let mut request = self.build_request(method, url, inbound_headers, body)?;

        let started = Instant::now();
        let _permit = self.limiter.acquire(&host, self.config.timeout).await?;
        *request.timeout_mut() = Some(remaining_budget(
            self.config.timeout,
            started.elapsed(),
            &host,
        )?);

        debug!(
            method = %request.method(),
            url = %request.url(),
            "Forwarding request to upstream"
        );

        let response = self.client.execute(request).await.map_err(classify_error)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(classify_error)?;

        Ok(ProxyResponse {
            status,
            content_type,
            body,
        })
    }
}

/// 上流クライアントを構築
///
/// TLS検証は無効（上流の身元確認は経路外で担保する前提）。
/// リダイレクトは追従せず、そのまま呼び出し元に返す。環境変数のプロキシ設定は使わない。
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_conns_per_host)
        .pool_idle_timeout(config.idle_timeout)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// エンドポイント + 転送先パスからURLを作る
pub fn target_url(endpoint: &str, downstream_path: &str) -> Result<Url, GatewayError> {
    let raw = format!("{}{}", endpoint.trim_end_matches('/'), downstream_path);
    Url::parse(&raw).map_err(|e| GatewayError::InvalidTargetUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })
}

/// 接続枠の待ち時間を差し引いた残りのタイムアウト
fn remaining_budget(budget: Duration, waited: Duration, host: &str) -> Result<Duration, GatewayError> {
    match budget.checked_sub(waited) {
        Some(remaining) if !remaining.is_zero() => Ok(remaining),
        _ => Err(GatewayError::UpstreamTimeout(format!(
            "no time left for {} after waiting {}ms for a connection slot",
            host,
            waited.as_millis()
        ))),
    }
}

fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

fn classify_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::UpstreamTimeout(e.to_string())
    } else {
        GatewayError::UpstreamUnreachable(e.to_string())
    }
}
