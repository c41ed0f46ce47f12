//! 転送ヘッダーのフィルタリング

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// クライアントツールが付与するトレースヘッダー
pub const TRACE_HEADER: &str = "postman-token";

/// 転送しないヘッダー（小文字）
///
/// `content-length` は送信ボディから転送層が再計算する。
pub const DENYLIST: &[&str] = &[
    "host",
    "user-agent",
    TRACE_HEADER,
    "origin",
    "content-length",
    // hop-by-hop
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// 転送しないヘッダーか判定
pub fn is_denied(name: &HeaderName) -> bool {
    // HeaderName::as_str は常に小文字
    DENYLIST.contains(&name.as_str())
}

/// 受信ヘッダーから転送用ヘッダーを作る
///
/// 拒否リスト以外はすべて、値の前後空白のみ取り除いてそのまま渡す。
/// 同名ヘッダーが複数あればすべて残す。
pub fn filter_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if is_denied(name) {
            continue;
        }
        outbound.append(name.clone(), trim_value(value));
    }
    outbound
}

fn trim_value(value: &HeaderValue) -> HeaderValue {
    let bytes = value.as_bytes();
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);

    if start == 0 && end == bytes.len() {
        return value.clone();
    }
    match HeaderValue::from_bytes(&bytes[start..end]) {
        Ok(mut trimmed) => {
            trimmed.set_sensitive(value.is_sensitive());
            trimmed
        }
        Err(_) => value.clone(),
    }
}
