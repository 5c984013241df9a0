// SPDX-License-Identifier: AGPL-3.0-or-later
//! Where the access token comes from

use dbxfs_core::{DbxError, DbxResult};
use dbxfs_providers::config::{DropboxConfig, TOKEN_ENV};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// `<config dir>/dbxfs/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "hyperpolymath", "dbxfs").map(|d| d.config_dir().join("config.toml"))
}

/// Token flag, then `DROPBOX_TOKEN`, then the given config file, then the
/// default config file.
pub fn resolve_config(token: Option<String>, config_path: Option<PathBuf>) -> DbxResult<DropboxConfig> {
    let env_token = DropboxConfig::from_env().map(|c| c.access_token);
    resolve_from(token, env_token, config_path.as_deref(), default_config_path().as_deref())
}

fn resolve_from(
    token: Option<String>,
    env_token: Option<String>,
    config_path: Option<&Path>,
    default_path: Option<&Path>,
) -> DbxResult<DropboxConfig> {
    // The file still supplies URLs and timeout when the token comes from elsewhere.
    let file_config = match (config_path, default_path) {
        (Some(path), _) => Some(DropboxConfig::from_file(path)?),
        (None, Some(path)) if path.exists() => Some(DropboxConfig::from_file(path)?),
        _ => None,
    };

    let override_token = token
        .or(env_token)
        .filter(|t| !t.trim().is_empty());

    match (override_token, file_config) {
        (Some(token), Some(mut config)) => {
            config.access_token = token;
            Ok(config)
        }
        (Some(token), None) => Ok(DropboxConfig::new(token)),
        (None, Some(config)) if config.has_token() => Ok(config),
        _ => Err(DbxError::AuthRequired(format!(
            "no access token: pass --token, set {TOKEN_ENV}, or write a config file"
        ))),
    }
}
