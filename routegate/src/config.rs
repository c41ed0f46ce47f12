//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs, and the typed settings
//! passed into the core components at construction time.

use std::time::Duration;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use routegate::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("ROUTEGATE_PORT", "ROUTEGATE_PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        if new_name != old_name {
            tracing::warn!(
                "Environment variable '{}' is deprecated, use '{}' instead",
                old_name,
                new_name
            );
        }
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// `true/1/yes/on` を真として解釈する
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 上流HTTPクライアント設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// リクエスト全体のタイムアウト（読み書き含む）
    pub timeout: Duration,
    /// TCP接続タイムアウト
    pub connect_timeout: Duration,
    /// ホストごとの最大同時接続数
    pub max_conns_per_host: usize,
    /// アイドル接続の保持時間
    pub idle_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            max_conns_per_host: 15_000,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl UpstreamConfig {
    /// Load upstream configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout_secs = get_env_with_fallback_parse(
            "ROUTEGATE_UPSTREAM_TIMEOUT_SECS",
            "ROUTEGATE_UPSTREAM_TIMEOUT_SECS",
            defaults.timeout.as_secs(),
        );
        let connect_timeout_secs = get_env_with_fallback_parse(
            "ROUTEGATE_UPSTREAM_CONNECT_TIMEOUT_SECS",
            "ROUTEGATE_UPSTREAM_CONNECT_TIMEOUT_SECS",
            defaults.connect_timeout.as_secs(),
        );
        let max_conns_per_host = get_env_with_fallback_parse(
            "ROUTEGATE_UPSTREAM_MAX_CONNS_PER_HOST",
            "ROUTEGATE_UPSTREAM_MAX_CONNS_PER_HOST",
            defaults.max_conns_per_host,
        );
        let idle_timeout_secs = get_env_with_fallback_parse(
            "ROUTEGATE_UPSTREAM_IDLE_TIMEOUT_SECS",
            "ROUTEGATE_UPSTREAM_IDLE_TIMEOUT_SECS",
            defaults.idle_timeout.as_secs(),
        );

        Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            max_conns_per_host: max_conns_per_host.max(1),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        }
    }
}

/// フラグストア接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagStoreConfig {
    /// `host:port`
    pub addr: String,
    /// 1回の読み取り（接続 + PING + GET）全体のタイムアウト
    pub timeout: Duration,
}

impl Default for FlagStoreConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            timeout: Duration::from_millis(200),
        }
    }
}

impl FlagStoreConfig {
    /// Load flag store configuration from environment variables.
    ///
    /// アドレスはCLI引数（`--flag-store`）側で解決するため、ここではタイムアウトのみ読む。
    pub fn from_env(addr: impl Into<String>) -> Self {
        let defaults = Self::default();
        let timeout_ms = get_env_with_fallback_parse(
            "ROUTEGATE_FLAG_STORE_TIMEOUT_MS",
            "ROUTEGATE_FLAG_STORE_TIMEOUT_MS",
            defaults.timeout.as_millis() as u64,
        );

        Self {
            addr: addr.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}
