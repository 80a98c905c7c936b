pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定ファイルパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "INFRAFLOW_CONFIG_PATH";
pub const STATE_DIR_ENV: &str = "INFRAFLOW_STATE_DIR";
pub const REGION_ENV: &str = "INFRAFLOW_REGION";
pub const ENDPOINT_ENV: &str = "INFRAFLOW_ENDPOINT";

pub const DEFAULT_STATE_DIR: &str = ".infraflow/state";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TOKEN_ENV: &str = "INFRAFLOW_API_TOKEN";

const CONFIG_FILE_NAME: &str = "infraflow.yaml";
const CONFIG_DIR_NAME: &str = ".infraflow";
const CONFIG_DIR_FILE_NAME: &str = "config.yaml";

/// InfraFlow の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// 状態ファイルの保存先
    pub state_dir: PathBuf,
    pub provider: ProviderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            provider: ProviderSettings::default(),
        }
    }
}

/// プロバイダー設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    pub kind: ProviderKind,

    /// コントロールプレーンの URL（http プロバイダーでは必須）
    pub endpoint: Option<String>,

    pub region: String,

    /// API トークンを読む環境変数名
    pub token_env: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

/// プロバイダーの種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Http,
    /// プロセス内のシミュレーション（状態はプロセス終了で消える）
    Memory,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProviderKind::Http),
            "memory" => Ok(ProviderKind::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "provider.kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Http => write!(f, "http"),
            ProviderKind::Memory => write!(f, "memory"),
        }
    }
}

impl Settings {
    /// 環境変数で設定値を上書き
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = non_empty_env(STATE_DIR_ENV) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(region) = non_empty_env(REGION_ENV) {
            self.provider.region = region;
        }
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            self.provider.endpoint = Some(endpoint);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// 設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 INFRAFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: infraflow.yaml
/// 3. ./.infraflow/config.yaml
/// 4. ~/.config/infraflow/config.yaml (グローバル設定)
///
/// 見つからなければ `None`（デフォルト設定を使う）
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Some(config_path) = non_empty_env(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(path = %path.display(), "{} が存在しないファイルを指しています", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリ
    let path = current_dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(Some(path));
    }

    // 3. ./.infraflow/ ディレクトリ
    let path = current_dir.join(CONFIG_DIR_NAME).join(CONFIG_DIR_FILE_NAME);
    if path.exists() {
        return Ok(Some(path));
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("infraflow").join(CONFIG_DIR_FILE_NAME);
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// 指定ファイルから設定を読み込む（環境変数の上書きは行わない）
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// 設定ファイルを探して読み込み、環境変数で上書きする
pub fn load_settings() -> Result<Settings> {
    let mut settings = match find_config_file()? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "設定ファイルを読み込みます");
            load_settings_from(&path)?
        }
        None => Settings::default(),
    };
    settings.apply_env_overrides();
    Ok(settings)
}
