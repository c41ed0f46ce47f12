//! パス解析
//!
//! `/{serviceName}/{serviceVersion}[/{rest...}]` 形式のパスから
//! ルートキーと転送先パスを取り出す。

use crate::common::error::GatewayError;
use std::fmt;

/// ルートキー（サービス名, バージョン）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// サービス名
    pub service_name: String,
    /// サービスバージョン
    pub service_version: String,
}

impl RouteKey {
    /// 新しいルートキーを作成
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_name, self.service_version)
    }
}

/// パス解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// ルートキー
    pub key: RouteKey,
    /// バックエンドへ転送するパス（常に `/` で始まる）
    pub downstream_path: String,
}

/// リクエストパスを解析する
///
/// 先頭の `/` を最大1つだけ取り除き、`/` で分割する。
/// 1番目がサービス名、2番目がバージョン、残りが転送先パスになる。
/// 文字種の検証は行わない（不正な名前はレジストリ参照で弾かれる）。
pub fn resolve_path(path: &str) -> Result<ResolvedPath, GatewayError> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);

    let mut segments = trimmed.split('/');
    let (Some(service_name), Some(service_version)) = (segments.next(), segments.next()) else {
        return Err(GatewayError::InvalidPath(path.to_string()));
    };

    let rest: Vec<&str> = segments.collect();
    let downstream_path = format!("/{}", rest.join("/"));

    Ok(ResolvedPath {
        key: RouteKey::new(service_name, service_version),
        downstream_path,
    })
}
