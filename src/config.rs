use crate::error::{PhotoScopeError, Result};
use photo_scope_common::{EndpointEnv, PhotoFieldName};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ベースURLの環境変数
pub const API_URL_ENV: &str = "PHOTO_SCOPE_API_URL";
/// デプロイ先ホストの環境変数
pub const HOST_ENV: &str = "PHOTO_SCOPE_HOST";

/// ビルド時に埋め込まれたベースURL
const BUILD_TIME_API_URL: Option<&str> = option_env!("PHOTO_SCOPE_API_URL");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub deployment_host: Option<String>,
    #[serde(default)]
    pub photo_field: PhotoFieldName,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotoScopeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-scope"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            base_url: None,
            deployment_host: None,
            photo_field: PhotoFieldName::Files,
            timeout_seconds: default_timeout(),
            download_dir: None,
        }
    }

    /// 明示設定のベースURL（CLI引数 > 環境変数 > 設定ファイル > ビルド時）
    pub fn endpoint_env(&self, cli_base_url: Option<&str>) -> EndpointEnv {
        EndpointEnv {
            configured: explicit_base_url(
                cli_base_url,
                std::env::var(API_URL_ENV).ok().as_deref(),
                self.base_url.as_deref(),
                BUILD_TIME_API_URL,
            ),
        }
    }

    /// デプロイ先ホスト（CLI引数 > 環境変数 > 設定ファイル）
    pub fn current_host(&self, cli_host: Option<&str>) -> Option<String> {
        first_non_blank(&[
            cli_host,
            std::env::var(HOST_ENV).ok().as_deref(),
            self.deployment_host.as_deref(),
        ])
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = Some(url);
        self.save()
    }

    pub fn set_deployment_host(&mut self, host: String) -> Result<()> {
        self.deployment_host = Some(host);
        self.save()
    }

    pub fn set_photo_field(&mut self, field: PhotoFieldName) -> Result<()> {
        self.photo_field = field;
        self.save()
    }
}

fn first_non_blank(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// 明示設定の優先順位を適用
pub fn explicit_base_url(
    cli: Option<&str>,
    env: Option<&str>,
    file: Option<&str>,
    build_time: Option<&str>,
) -> Option<String> {
    first_non_blank(&[cli, env, file, build_time])
}
