//! Remote storage clients for dbxfs
//!
//! Each client implements [`dbxfs_core::RemoteClient`] and is plugged into a
//! [`dbxfs_core::RemoteFileSystem`].

pub mod config;

#[cfg(feature = "dropbox")]
pub mod dropbox;

pub use config::DropboxConfig;

#[cfg(feature = "dropbox")]
pub use dropbox::DropboxClient;

#[cfg(feature = "dropbox")]
use dbxfs_core::{DbxResult, RemoteFileSystem};
#[cfg(feature = "dropbox")]
use std::sync::Arc;

/// Filesystem over a Dropbox account, logging through `tracing`.
#[cfg(feature = "dropbox")]
pub fn dropbox_fs(config: DropboxConfig) -> DbxResult<RemoteFileSystem<DropboxClient>> {
    let client = DropboxClient::new(config)?;
    Ok(RemoteFileSystem::new(Arc::new(client)))
}
