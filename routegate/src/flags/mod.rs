//! トラフィックフラグストア
//!
//! サービスバージョンをキーにした真偽値フラグの外部ストア。
//! 値はルーティング判断のたびに読み直す（キャッシュしない）。

pub mod redis_store;

pub use redis_store::RedisFlagStore;

use crate::common::error::GatewayError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// フラグストアの読み取り能力
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// 疎通確認
    async fn ping(&self) -> Result<(), GatewayError>;

    /// フラグを取得
    ///
    /// キーが存在しない場合は `false`。ストアに到達できない場合は
    /// `GatewayError::FlagStoreUnavailable`。
    async fn get_flag(&self, key: &str) -> Result<bool, GatewayError>;
}

/// ストアに保存された文字列を真偽値として解釈する
///
/// `1`, `t`, `T`, `true`, `TRUE`, `True` のみtrue。それ以外はすべてfalse。
pub fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "true" | "TRUE" | "True")
}

/// インメモリのフラグストア
///
/// Redisなしでのローカル実行とテスト用。`set_unavailable(true)` で障害を再現できる。
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    values: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl InMemoryFlagStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を設定
    pub async fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// 値を削除
    pub async fn remove(&self, key: &str) {
        self.values.write().await.remove(key);
    }

    /// 障害状態を切り替える
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::FlagStoreUnavailable(
                "in-memory flag store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.check_available()
    }

    async fn get_flag(&self, key: &str) -> Result<bool, GatewayError> {
        self.check_available()?;
        Ok(self
            .values
            .read()
            .await
            .get(key)
            .map(|v| parse_flag(v))
            .unwrap_or(false))
    }
}
