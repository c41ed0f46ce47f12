//! ゲートウェイハンドラー
//!
//! パス解析 → エンドポイント選択 → 転送 → 上流レスポンスの中継

use crate::api::error::AppError;
use crate::common::error::GatewayError;
use crate::forward::ProxyResponse;
use crate::route::{resolve_path, RouteKey};
use crate::AppState;
use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// 正常に転送できたリクエストの結果
struct Forwarded {
    key: RouteKey,
    endpoint: String,
    response: ProxyResponse,
}

/// すべてのメソッド・パスを受けるハンドラー
///
/// 失敗時は構造化エラーボディを返す。上流の4xx/5xxはエラー扱いせずそのまま中継する。
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("gateway", %request_id, %method, path = %uri.path());

    async move {
        let started = Instant::now();
        match route_request(&state, method, &uri, &headers, body).await {
            Ok(forwarded) => {
                info!(
                    service = %forwarded.key.service_name,
                    version = %forwarded.key.service_version,
                    endpoint = %forwarded.endpoint,
                    status = forwarded.response.status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request forwarded"
                );
                relay(forwarded.response)
            }
            Err(e) => {
                let status = e.status_code();
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if status.is_server_error() {
                    error!(error = %e, status = status.as_u16(), elapsed_ms, "Request failed");
                } else {
                    warn!(error = %e, status = status.as_u16(), elapsed_ms, "Request rejected");
                }
                AppError(e).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn route_request(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Body,
) -> Result<Forwarded, GatewayError> {
    let resolved = resolve_path(uri.path())?;
    let downstream_path = match uri.query() {
        Some(query) => format!("{}?{}", resolved.downstream_path, query),
        None => resolved.downstream_path,
    };

    let endpoint = state.selector.select(&resolved.key).await?;

    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    let response = state
        .proxy
        .forward(method, &endpoint, &downstream_path, headers, body)
        .await?;

    Ok(Forwarded {
        key: resolved.key,
        endpoint,
        response,
    })
}

/// 上流レスポンスをクライアント向けに変換
///
/// ステータス・Content-Type・ボディのみを引き継ぐ。
fn relay(upstream: ProxyResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    if let Some(content_type) = upstream.content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    response
}
