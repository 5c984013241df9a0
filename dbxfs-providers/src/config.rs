//! Client configuration

use dbxfs_core::{DbxError, DbxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Environment variable holding the access token
pub const TOKEN_ENV: &str = "DROPBOX_TOKEN";

/// Dropbox client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DropboxConfig {
    /// May be left out of a file when supplied on the command line or by
    /// the environment.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_content_url")]
    pub content_url: String,
    /// Per-request timeout; transport default when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_content_url() -> String {
    DEFAULT_CONTENT_URL.to_string()
}

impl DropboxConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: default_api_url(),
            content_url: default_content_url(),
            timeout_secs: None,
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    pub fn has_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> DbxResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let config: DropboxConfig = match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents).map_err(|e| DbxError::Config(e.to_string()))?,
            "json" => serde_json::from_str(&contents).map_err(|e| DbxError::Config(e.to_string()))?,
            _ => {
                return Err(DbxError::Config(format!(
                    "unsupported config file extension: {}",
                    ext
                )))
            }
        };
        Ok(config)
    }
}

impl fmt::Debug for DropboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxConfig")
            .field("access_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("content_url", &self.content_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
