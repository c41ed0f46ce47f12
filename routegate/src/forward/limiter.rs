//! ホストごとの同時接続数制限

use crate::common::error::GatewayError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 上流ホストごとの同時接続数を一元的に制限する
///
/// パーミットは転送完了（またはリクエストのキャンセル）でドロップされ、返却される。
#[derive(Debug, Clone)]
pub struct HostLimiter {
    max_per_host: usize,
    hosts: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl HostLimiter {
    /// ホストあたりの上限を指定して作成
    pub fn new(max_per_host: usize) -> Self {
        Self {
            max_per_host: max_per_host.max(1),
            hosts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_host)))
            .clone()
    }

    /// パーミットを取得（`wait` を超えたら `UpstreamTimeout`）
    pub async fn acquire(
        &self,
        host: &str,
        wait: Duration,
    ) -> Result<OwnedSemaphorePermit, GatewayError> {
        let semaphore = self.semaphore(host);
        match tokio::time::timeout(wait, semaphore.acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(GatewayError::UpstreamUnreachable(format!(
                "connection limiter for {} closed",
                host
            ))),
            Err(_) => Err(GatewayError::UpstreamTimeout(format!(
                "waited {}ms for a connection slot to {}",
                wait.as_millis(),
                host
            ))),
        }
    }

    /// 空きパーミット数（未使用ホストは `None`）
    pub fn available(&self, host: &str) -> Option<usize> {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts.get(host).map(|s| s.available_permits())
    }

    /// ホストあたりの上限
    pub fn max_per_host(&self) -> usize {
        self.max_per_host
    }
}
