//! Top-level application configuration.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory (or at the path named by `ISSUELENS_CONFIG`) and includes:
//! - GitLab base URL and personal access token
//! - Page size, request timeout and search debounce interval
//!
//! `GITLAB_URL` and `GITLAB_TOKEN` take precedence over the file.
//!
//! Nothing in the crate keeps a global copy of the configuration. Callers
//! hand a [`ConfigProvider`] to the client, which asks it for the current
//! values on every request.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IssueLensError, Result};

pub const CONFIG_PATH_ENV: &str = "ISSUELENS_CONFIG";
pub const URL_ENV: &str = "GITLAB_URL";
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

fn default_per_page() -> u32 {
    20
}

fn default_timeout() -> u64 {
    30
}

fn default_search_debounce_ms() -> u64 {
    300
}

/// On-disk configuration file
#[derive(Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// GitLab instance root, e.g. `https://gitlab.example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Personal access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Issues requested per page (default: 20)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Quiet period before a typeahead lookup is sent (default: 300)
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            per_page: default_per_page(),
            timeout: default_timeout(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("per_page", &self.per_page)
            .field("timeout", &self.timeout)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .finish()
    }
}

impl ConfigFile {
    /// Location of the config file: `$ISSUELENS_CONFIG`, else the platform
    /// config directory.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        ProjectDirs::from("", "", "issuelens")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .ok_or_else(|| {
                IssueLensError::Config("could not determine a config directory".to_string())
            })
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            IssueLensError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: ConfigFile = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// GitLab URL from environment variable or config file
    pub fn effective_url(&self) -> Option<String> {
        if let Ok(url) = env::var(URL_ENV)
            && !url.is_empty()
        {
            return Some(url);
        }
        self.url.clone()
    }

    /// GitLab token from environment variable or config file
    pub fn effective_token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.token.clone()
    }

    /// Build the runtime configuration, failing if URL or token is missing.
    pub fn resolve(&self) -> Result<GitLabConfig> {
        let url = self.effective_url().ok_or_else(|| {
            IssueLensError::Config(format!(
                "GitLab URL not configured. Set {URL_ENV} or add `url:` to the config file"
            ))
        })?;
        let token = self.effective_token().ok_or_else(|| {
            IssueLensError::Auth(format!(
                "GitLab token not configured. Set {TOKEN_ENV} or add `token:` to the config file"
            ))
        })?;

        Ok(GitLabConfig::new(&url, token)?
            .with_per_page(self.per_page)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_search_debounce(Duration::from_millis(self.search_debounce_ms)))
    }
}

/// Resolved connection settings handed to every remote call.
#[derive(Clone)]
pub struct GitLabConfig {
    base_url: String,
    token: Arc<SecretBox<String>>,
    per_page: u32,
    timeout: Duration,
    search_debounce: Duration,
}

impl GitLabConfig {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| IssueLensError::Config(format!("invalid GitLab URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(IssueLensError::Config(format!(
                "invalid GitLab URL '{base_url}': expected http or https"
            )));
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token: Arc::new(SecretBox::new(Box::new(token.into()))),
            per_page: default_per_page(),
            timeout: Duration::from_secs(default_timeout()),
            search_debounce: Duration::from_millis(default_search_debounce_ms()),
        })
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_search_debounce(mut self, interval: Duration) -> Self {
        self.search_debounce = interval;
        self
    }

    /// Instance root without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &SecretBox<String> {
        &self.token
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    /// Absolute URL of a REST v4 endpoint. `path` starts with `/`.
    pub fn api_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/api/v4{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| IssueLensError::Config(format!("invalid API URL '{raw}': {e}")))
    }
}

impl fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token_set = !self.token.expose_secret().is_empty();
        f.debug_struct("GitLabConfig")
            .field("base_url", &self.base_url)
            .field("token", &if token_set { "[REDACTED]" } else { "" })
            .field("per_page", &self.per_page)
            .field("timeout", &self.timeout)
            .field("search_debounce", &self.search_debounce)
            .finish()
    }
}

/// Source of the current connection settings.
///
/// Implementations are consulted on every request, so a settings change is
/// picked up without rebuilding the client.
pub trait ConfigProvider: Send + Sync {
    fn current(&self) -> Result<GitLabConfig>;
}

impl ConfigProvider for GitLabConfig {
    fn current(&self) -> Result<GitLabConfig> {
        Ok(self.clone())
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for Arc<P> {
    fn current(&self) -> Result<GitLabConfig> {
        (**self).current()
    }
}

/// Reads the config file and environment each time it is asked.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_default_path() -> Result<Self> {
        Ok(Self::new(ConfigFile::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn current(&self) -> Result<GitLabConfig> {
        ConfigFile::load_from(&self.path)?.resolve()
    }
}
