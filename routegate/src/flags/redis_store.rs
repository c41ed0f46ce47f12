//! Redisフラグストア
//!
//! 1回の読み取りは PING（疎通確認）と GET を1往復のパイプラインで送り、
//! 接続確立を含めた全体を短いタイムアウトで打ち切る。

use super::{parse_flag, FlagStore};
use crate::common::error::{ConfigError, GatewayError};
use crate::config::FlagStoreConfig;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// Redisフラグストア
///
/// 多重化接続を1本保持して使い回す。失敗した接続は破棄し、次回の読み取りで張り直す。
pub struct RedisFlagStore {
    config: FlagStoreConfig,
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisFlagStore {
    /// 設定からクライアントを作成（接続は遅延）
    pub fn new(config: FlagStoreConfig) -> Result<Self, ConfigError> {
        let client = redis::Client::open(format!("redis://{}/", config.addr))
            .map_err(|e| ConfigError::FlagStore(format!("{}: {}", config.addr, e)))?;
        Ok(Self {
            config,
            client,
            connection: Mutex::new(None),
        })
    }

    /// 接続先アドレス
    pub fn addr(&self) -> &str {
        &self.config.addr
    }

    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        let mut cached = self.connection.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        *cached = Some(conn.clone());
        Ok(conn)
    }

    async fn discard_connection(&self) {
        self.connection.lock().await.take();
    }

    /// 接続 + 処理をタイムアウト付きで実行し、失敗はすべて `FlagStoreUnavailable` にする
    async fn with_timeout<T, F, Fut>(&self, op: F) -> Result<T, GatewayError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let attempt = async {
            let conn = self.connection().await?;
            op(conn).await
        };

        let failure = match tokio::time::timeout(self.config.timeout, attempt).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => format!("{}: {}", self.config.addr, e),
            Err(_) => format!(
                "{}: timed out after {}ms",
                self.config.addr,
                self.config.timeout.as_millis()
            ),
        };

        self.discard_connection().await;
        Err(GatewayError::FlagStoreUnavailable(failure))
    }
}

#[async_trait]
impl FlagStore for RedisFlagStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.with_timeout(|mut conn| async move {
            redis::cmd("PING").query_async::<_, String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }

    async fn get_flag(&self, key: &str) -> Result<bool, GatewayError> {
        let (_pong, value): (String, Option<String>) = self
            .with_timeout(|mut conn| async move {
                redis::pipe()
                    .cmd("PING")
                    .cmd("GET")
                    .arg(key)
                    .query_async(&mut conn)
                    .await
            })
            .await?;

        debug!(key, value = ?value, "Read traffic flag");
        Ok(value.as_deref().map(parse_flag).unwrap_or(false))
    }
}
