//! Dropbox client
//!
//! Dropbox API v2 over one shared HTTP session. Each trait method is a single
//! API call; pagination, buffering and copy semantics live in `dbxfs-core`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dbxfs_core::client::{CommitInfo, ListFolderPage, RemoteClient, UploadSessionCursor, WriteMode};
use dbxfs_core::{DbxError, DbxResult, RemoteMetadata};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DropboxConfig;

const PROVIDER: &str = "dropbox";

/// Dropbox client
pub struct DropboxClient {
    config: DropboxConfig,
    http: Client,
}

impl DropboxClient {
    pub fn new(config: DropboxConfig) -> DbxResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| DbxError::Network(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &DropboxConfig {
        &self.config
    }

    /// Authenticated RPC call on the API host
    async fn api_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: impl Serialize,
        subject: &str,
    ) -> DbxResult<T> {
        let url = format!("{}/{}", self.config.api_url, endpoint);
        tracing::debug!(endpoint, subject, "dropbox rpc");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DbxError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &error_text, subject));
        }

        response
            .json()
            .await
            .map_err(|e| DbxError::Serialization(e.to_string()))
    }

    /// Authenticated upload call on the content host; arguments travel in the
    /// `Dropbox-API-Arg` header.
    async fn content_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        arg: impl Serialize,
        data: Bytes,
        subject: &str,
    ) -> DbxResult<T> {
        let url = format!("{}/{}", self.config.content_url, endpoint);
        let arg = header_arg(&arg)?;
        tracing::debug!(endpoint, subject, bytes = data.len(), "dropbox upload");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .header("Dropbox-API-Arg", arg)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| DbxError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &error_text, subject));
        }

        response
            .json()
            .await
            .map_err(|e| DbxError::Serialization(e.to_string()))
    }
}

/// Dropbox wants the root as the empty string.
fn to_dropbox_path(path: &str) -> String {
    if path == "/" {
        String::new()
    } else {
        path.to_string()
    }
}

/// JSON for the `Dropbox-API-Arg` header. Header values must be ASCII, so
/// everything else is `\u` escaped.
fn header_arg(arg: &impl Serialize) -> DbxResult<String> {
    let json = serde_json::to_string(arg).map_err(|e| DbxError::Serialization(e.to_string()))?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: Option<String>,
}

/// Map a failed response onto the error the rest of the workspace expects.
fn api_error(status: StatusCode, body: &str, subject: &str) -> DbxError {
    let summary = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error_summary)
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => DbxError::AuthRequired(summary),
        StatusCode::CONFLICT => {
            if summary.contains("not_found") {
                DbxError::NotFound(subject.to_string())
            } else if summary.contains("malformed_path") {
                DbxError::InvalidPath(subject.to_string())
            } else if summary.contains("conflict/") {
                DbxError::AlreadyExists(subject.to_string())
            } else {
                DbxError::Conflict(format!("{}: {}", subject, summary))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => DbxError::Network(format!("rate limited: {}", summary)),
        s if s.is_server_error() => DbxError::Network(format!("{}: {}", s, summary)),
        s => DbxError::ProviderApi {
            provider: PROVIDER.into(),
            message: format!("{}: {}", s, summary),
        },
    }
}

/// Dropbox file/folder metadata response
#[derive(Debug, Deserialize)]
struct DropboxMetadata {
    #[serde(rename = ".tag")]
    tag: Option<String>,
    name: String,
    path_display: Option<String>,
    size: Option<u64>,
    server_modified: Option<String>,
    rev: Option<String>,
    content_hash: Option<String>,
}

impl DropboxMetadata {
    /// Untagged responses (upload commit) are file metadata.
    fn into_metadata(self) -> RemoteMetadata {
        let path_display = self.path_display.unwrap_or(self.name);
        match (self.tag.as_deref(), self.size) {
            (Some("file"), size) | (None, size @ Some(_)) => RemoteMetadata::File {
                path_display,
                size: size.unwrap_or(0),
                server_modified: self
                    .server_modified
                    .as_deref()
                    .and_then(|m| DateTime::parse_from_rfc3339(m).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                rev: self.rev,
                content_hash: self.content_hash,
            },
            (Some("folder"), _) => RemoteMetadata::Folder { path_display },
            _ => RemoteMetadata::Other { path_display },
        }
    }
}

/// List folder response
#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<DropboxMetadata>,
    cursor: String,
    has_more: bool,
}

impl From<ListFolderResponse> for ListFolderPage {
    fn from(resp: ListFolderResponse) -> Self {
        ListFolderPage {
            entries: resp.entries.into_iter().map(DropboxMetadata::into_metadata).collect(),
            cursor: resp.cursor,
            has_more: resp.has_more,
        }
    }
}

/// `{metadata: ...}` wrapper used by the v2 endpoints
#[derive(Debug, Deserialize)]
struct MetadataResult {
    metadata: DropboxMetadata,
}

#[derive(Serialize)]
struct PathArg {
    path: String,
}

#[derive(Serialize)]
struct SessionCursorArg<'a> {
    session_id: &'a str,
    offset: u64,
}

impl<'a> From<&'a UploadSessionCursor> for SessionCursorArg<'a> {
    fn from(cursor: &'a UploadSessionCursor) -> Self {
        Self { session_id: &cursor.session_id, offset: cursor.offset }
    }
}

#[derive(Serialize)]
struct CommitArg<'a> {
    path: &'a str,
    mode: &'static str,
    autorename: bool,
    mute: bool,
}

impl<'a> From<&'a CommitInfo> for CommitArg<'a> {
    fn from(commit: &'a CommitInfo) -> Self {
        let mode = match commit.mode {
            WriteMode::Add => "add",
            WriteMode::Overwrite => "overwrite",
        };
        Self { path: &commit.path, mode, autorename: commit.autorename, mute: false }
    }
}

#[async_trait]
impl RemoteClient for DropboxClient {
    async fn list_folder(&self, path: &str, recursive: bool) -> DbxResult<ListFolderPage> {
        #[derive(Serialize)]
        struct ListFolderArg {
            path: String,
            recursive: bool,
            include_deleted: bool,
        }

        let result: ListFolderResponse = self
            .api_request(
                "files/list_folder",
                ListFolderArg {
                    path: to_dropbox_path(path),
                    recursive,
                    include_deleted: false,
                },
                path,
            )
            .await?;
        Ok(result.into())
    }

    async fn list_folder_continue(&self, cursor: &str) -> DbxResult<ListFolderPage> {
        #[derive(Serialize)]
        struct ListFolderContinueArg<'a> {
            cursor: &'a str,
        }

        let result: ListFolderResponse = self
            .api_request("files/list_folder/continue", ListFolderContinueArg { cursor }, cursor)
            .await?;
        Ok(result.into())
    }

    async fn get_metadata(&self, path: &str) -> DbxResult<RemoteMetadata> {
        let dropbox_path = to_dropbox_path(path);
        if dropbox_path.is_empty() {
            // The API has no metadata for the root folder.
            return Ok(RemoteMetadata::folder("/"));
        }

        let result: DropboxMetadata = self
            .api_request("files/get_metadata", PathArg { path: dropbox_path }, path)
            .await?;
        Ok(result.into_metadata())
    }

    async fn create_folder(&self, path: &str) -> DbxResult<RemoteMetadata> {
        #[derive(Serialize)]
        struct CreateFolderArg {
            path: String,
            autorename: bool,
        }

        let result: MetadataResult = self
            .api_request(
                "files/create_folder_v2",
                CreateFolderArg { path: to_dropbox_path(path), autorename: false },
                path,
            )
            .await?;
        // create_folder_v2 returns untagged folder metadata
        Ok(RemoteMetadata::Folder {
            path_display: result.metadata.path_display.unwrap_or(result.metadata.name),
        })
    }

    async fn delete(&self, path: &str) -> DbxResult<RemoteMetadata> {
        let result: MetadataResult = self
            .api_request("files/delete_v2", PathArg { path: to_dropbox_path(path) }, path)
            .await?;
        Ok(result.metadata.into_metadata())
    }

    async fn copy(&self, from: &str, to: &str) -> DbxResult<RemoteMetadata> {
        #[derive(Serialize)]
        struct RelocationArg {
            from_path: String,
            to_path: String,
            autorename: bool,
        }

        let result: MetadataResult = self
            .api_request(
                "files/copy_v2",
                RelocationArg {
                    from_path: to_dropbox_path(from),
                    to_path: to_dropbox_path(to),
                    autorename: false,
                },
                from,
            )
            .await?;
        Ok(result.metadata.into_metadata())
    }

    async fn get_temporary_link(&self, path: &str) -> DbxResult<String> {
        #[derive(Deserialize)]
        struct TemporaryLinkResult {
            link: String,
        }

        let result: TemporaryLinkResult = self
            .api_request("files/get_temporary_link", PathArg { path: to_dropbox_path(path) }, path)
            .await?;
        Ok(result.link)
    }

    async fn download_range(&self, link: &str, start: u64, end: u64) -> DbxResult<Bytes> {
        if end <= start {
            return Ok(Bytes::new());
        }

        // Temporary links are pre-authorized; no bearer token.
        let response = self
            .http
            .get(link)
            .header(header::RANGE, format!("bytes={}-{}", start, end - 1))
            .send()
            .await
            .map_err(|e| DbxError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &error_text, link));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DbxError::Network(e.to_string()))?;

        if status == StatusCode::PARTIAL_CONTENT {
            Ok(body)
        } else {
            // Server ignored the range and sent everything.
            let to = (end as usize).min(body.len());
            let from = (start as usize).min(to);
            Ok(body.slice(from..to))
        }
    }

    async fn upload_session_start(&self) -> DbxResult<String> {
        #[derive(Serialize)]
        struct StartArg {
            close: bool,
        }

        #[derive(Deserialize)]
        struct StartResult {
            session_id: String,
        }

        let result: StartResult = self
            .content_request("files/upload_session/start", StartArg { close: false }, Bytes::new(), "")
            .await?;
        Ok(result.session_id)
    }

    async fn upload_session_append(&self, data: Bytes, cursor: &UploadSessionCursor) -> DbxResult<()> {
        #[derive(Serialize)]
        struct AppendArg<'a> {
            cursor: SessionCursorArg<'a>,
            close: bool,
        }

        let _: serde_json::Value = self
            .content_request(
                "files/upload_session/append_v2",
                AppendArg { cursor: cursor.into(), close: false },
                data,
                &cursor.session_id,
            )
            .await?;
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Bytes,
        cursor: &UploadSessionCursor,
        commit: &CommitInfo,
    ) -> DbxResult<RemoteMetadata> {
        #[derive(Serialize)]
        struct FinishArg<'a> {
            cursor: SessionCursorArg<'a>,
            commit: CommitArg<'a>,
        }

        let result: DropboxMetadata = self
            .content_request(
                "files/upload_session/finish",
                FinishArg { cursor: cursor.into(), commit: commit.into() },
                data,
                &commit.path,
            )
            .await?;
        Ok(result.into_metadata())
    }
}
