//! Remote client boundary
//!
//! Everything the filesystem needs from the storage service, one remote call
//! per method. Implementations must not retry or cache.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{entry::RemoteMetadata, error::DbxResult};

/// One page of a folder listing
#[derive(Debug, Clone, Default)]
pub struct ListFolderPage {
    pub entries: Vec<RemoteMetadata>,
    pub cursor: String,
    pub has_more: bool,
}

/// Position inside an open upload session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSessionCursor {
    pub session_id: String,
    pub offset: u64,
}

/// Conflict behavior when an upload is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Add,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
}

/// Remote storage client
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_folder(&self, path: &str, recursive: bool) -> DbxResult<ListFolderPage>;
    async fn list_folder_continue(&self, cursor: &str) -> DbxResult<ListFolderPage>;
    async fn get_metadata(&self, path: &str) -> DbxResult<RemoteMetadata>;
    async fn create_folder(&self, path: &str) -> DbxResult<RemoteMetadata>;
    async fn delete(&self, path: &str) -> DbxResult<RemoteMetadata>;
    async fn copy(&self, from: &str, to: &str) -> DbxResult<RemoteMetadata>;

    /// Short-lived direct download URL.
    async fn get_temporary_link(&self, path: &str) -> DbxResult<String>;

    /// Fetch bytes `start..end` (end exclusive) from a temporary link.
    async fn download_range(&self, link: &str, start: u64, end: u64) -> DbxResult<Bytes>;

    async fn upload_session_start(&self) -> DbxResult<String>;
    async fn upload_session_append(&self, data: Bytes, cursor: &UploadSessionCursor) -> DbxResult<()>;
    async fn upload_session_finish(
        &self,
        data: Bytes,
        cursor: &UploadSessionCursor,
        commit: &CommitInfo,
    ) -> DbxResult<RemoteMetadata>;

    /// Existence as seen by a metadata lookup; any failure reads as absent.
    async fn exists(&self, path: &str) -> bool {
        match self.get_metadata(path).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                tracing::debug!(path, error = %e, "metadata lookup failed, treating as absent");
                false
            }
        }
    }
}
