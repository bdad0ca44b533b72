use std::path::{Path, PathBuf};

use agave_engine::ClientConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured tenant URL.
pub const TENANT_URL_ENV: &str = "AGAVE_TENANT_URL";

/// On-disk client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  #[serde(flatten)]
  pub client: ClientConfig,
}

impl Config {
  /// `~/.agave/config.json`, when a home directory is known.
  pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agave").join("config.json"))
  }

  /// Read a JSON configuration file, then apply environment overrides.
  pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    Ok(config.with_tenant_override(std::env::var(TENANT_URL_ENV).ok()))
  }

  /// Load from [`Config::default_path`], or fall back to the defaults when
  /// no file exists there.
  pub async fn load_default() -> Result<Self> {
    match Self::default_path() {
      Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => Self::load(path).await,
      _ => Ok(Self::default().with_tenant_override(std::env::var(TENANT_URL_ENV).ok())),
    }
  }

  fn with_tenant_override(mut self, tenant_url: Option<String>) -> Self {
    if let Some(url) = tenant_url.filter(|url| !url.is_empty()) {
      self.client.tenant_url = url;
    }
    self
  }
}
