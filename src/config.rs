use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub backend: BackendConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Rows per page in list views
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Admin account used by `login`
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Backend root; the API lives under `{url}/api/`
  #[serde(default = "default_backend_url")]
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a fetched page is refetched on access
  #[serde(default = "default_stale_after_secs")]
  pub stale_after_secs: i64,
  /// Keep last-known-good pages on disk
  #[serde(default = "default_true")]
  pub persist: bool,
  /// Refetch cached pages in the background after a delete settles
  #[serde(default = "default_true")]
  pub background_refetch: bool,
  /// Override for the cache database location
  pub path: Option<PathBuf>,
}

fn default_page_size() -> u32 {
  8
}

fn default_backend_url() -> String {
  DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_stale_after_secs() -> i64 {
  5 * 60
}

fn default_true() -> bool {
  true
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: default_backend_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_after_secs: default_stale_after_secs(),
      persist: true,
      background_refetch: true,
      path: None,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      backend: BackendConfig::default(),
      cache: CacheConfig::default(),
      page_size: default_page_size(),
      email: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./market-admin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/market-admin/config.yaml
  ///
  /// Without a file the defaults apply. `MARKET_ADMIN_BACKEND_URL` overrides
  /// the backend URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("MARKET_ADMIN_BACKEND_URL") {
      if !url.trim().is_empty() {
        config.backend.url = url;
      }
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("market-admin.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("market-admin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    if self.cache.stale_after_secs < 0 {
      return Err(eyre!("cache.stale_after_secs cannot be negative"));
    }
    Ok(())
  }

  /// Get the bearer token from the environment, if set.
  ///
  /// Checks MARKET_ADMIN_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("MARKET_ADMIN_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }

  /// Get the admin password from environment variables.
  ///
  /// Checks MARKET_ADMIN_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("MARKET_ADMIN_PASSWORD").map_err(|_| {
      eyre!("Admin password not found. Set MARKET_ADMIN_PASSWORD environment variable.")
    })
  }
}
