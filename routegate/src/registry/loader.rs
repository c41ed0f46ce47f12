//! レジストリファイル読み込み
//!
//! 拡張子が `.json` ならJSON、それ以外はYAMLとして解析する。
//!
//! ```yaml
//! service1:
//!   Key:
//!     - http://abcMock.com
//!     - https://abcActual.com
//! ```

use super::RegistrySnapshot;
use crate::common::error::ConfigError;
use std::path::Path;

/// ファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl RegistryFormat {
    /// パスの拡張子から形式を判定
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// 文字列からスナップショットを解析（検証は行わない）
pub fn parse_registry(
    content: &str,
    format: RegistryFormat,
    origin: &str,
) -> Result<RegistrySnapshot, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: origin.to_string(),
        message,
    };

    match format {
        RegistryFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        RegistryFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// ファイルからスナップショットを読み込み、検証する
pub fn load_from_file(path: &Path) -> Result<RegistrySnapshot, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;

    let snapshot = parse_registry(&content, RegistryFormat::from_path(path), &display)?;
    snapshot.validate()?;
    Ok(snapshot)
}
