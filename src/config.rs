use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{EnvToken, StaticToken, TokenProvider};
use crate::cache::SqliteStorage;
use crate::store::{StoreOptions, DEFAULT_CACHE_KEY, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Custom title for header (defaults to the API domain if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the customer API, e.g. https://api.example.com
  pub base_url: String,
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
  /// Extra query parameters sent with every page request
  #[serde(default)]
  pub filters: BTreeMap<String, String>,
  /// Bearer token. Prefer the environment; this exists for throwaway setups.
  pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Key the listing is stored under
  #[serde(default = "default_cache_key")]
  pub key: String,
  /// Database file (default: $XDG_DATA_HOME/custlist/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      key: default_cache_key(),
      path: None,
    }
  }
}

fn default_page_size() -> u32 {
  DEFAULT_PAGE_SIZE
}

fn default_request_timeout() -> u64 {
  30
}

fn default_true() -> bool {
  true
}

fn default_cache_key() -> String {
  DEFAULT_CACHE_KEY.to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./custlist.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/custlist/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => p.to_path_buf(),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file().ok_or_else(|| {
        eyre!(
          "No configuration file found. Create one at ~/.config/custlist/config.yaml\n\
           with at least:\n\n  api:\n    base_url: https://your-api.example.com"
        )
      })?,
    };

    Self::load_from_path(&path)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("custlist.yaml");
    if local.exists() {
      return Some(local);
    }

    dirs::config_dir()
      .map(|dir| dir.join("custlist").join("config.yaml"))
      .filter(|path| path.exists())
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.api.base_url.trim().is_empty() {
      return Err(eyre!("api.base_url must not be empty"));
    }
    if self.api.page_size == 0 {
      return Err(eyre!("api.page_size must be at least 1"));
    }
    if self.cache.key.is_empty() {
      return Err(eyre!("cache.key must not be empty"));
    }
    Ok(())
  }

  /// Token from the config file if set, otherwise from the environment.
  pub fn token_provider(&self) -> Arc<dyn TokenProvider> {
    match &self.api.token {
      Some(token) => Arc::new(StaticToken::new(token.clone())),
      None => Arc::new(EnvToken::new()),
    }
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      cache_key: self.cache.key.clone(),
      page_size: self.api.page_size,
      filters: self.api.filters.clone(),
    }
  }

  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(path) => Ok(path.clone()),
      None => Ok(SqliteStorage::default_path()?),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  base_url: https://api.example.com\n").unwrap();

    assert_eq!(config.api.page_size, 20);
    assert_eq!(config.api.request_timeout_secs, 30);
    assert!(config.api.filters.is_empty());
    assert!(config.cache.enabled);
    assert_eq!(config.cache.key, "user_realm_id");
    assert_eq!(config.title, None);
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
title: Field customers
api:
  base_url: https://api.example.com/
  page_size: 50
  request_timeout_secs: 5
  filters:
    region: west
cache:
  enabled: false
  key: west_customers
  path: /tmp/custlist-test.db
"#;
    let config = Config::parse(yaml).unwrap();

    assert_eq!(config.title.as_deref(), Some("Field customers"));
    assert_eq!(config.api.filters.get("region").map(String::as_str), Some("west"));
    assert!(!config.cache.enabled);

    let options = config.store_options();
    assert_eq!(options.page_size, 50);
    assert_eq!(options.cache_key, "west_customers");
    assert_eq!(
      config.cache_path().unwrap(),
      PathBuf::from("/tmp/custlist-test.db")
    );
  }

  #[test]
  fn test_zero_page_size_is_rejected() {
    let err = Config::parse("api:\n  base_url: https://a.example\n  page_size: 0\n").unwrap_err();
    assert!(err.to_string().contains("page_size"));
  }

  #[test]
  fn test_missing_api_section_is_rejected() {
    assert!(Config::parse("title: nothing else\n").is_err());
  }

  #[test]
  fn test_load_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api:\n  base_url: https://api.example.com").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.api.base_url, "https://api.example.com");
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_config_token_wins_over_environment() {
    let config =
      Config::parse("api:\n  base_url: https://a.example\n  token: from-file\n").unwrap();
    assert_eq!(config.token_provider().bearer_token().unwrap(), "from-file");
  }
}
