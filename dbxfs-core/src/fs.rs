//! Filesystem facade over a remote client
//!
//! Listing, metadata, mkdir and rm never fail: remote errors are handed to the
//! [`DiagnosticSink`] and a `None` comes back. Copy is stricter and follows its
//! [`ErrorPolicy`](crate::operations::ErrorPolicy). Both behaviors are relied
//! on by callers.

use bytes::Bytes;
use std::sync::Arc;

use crate::client::RemoteClient;
use crate::copy::{self, CopyExecutor, CopyPlan, CopyResolver, CopySource};
use crate::entry::{FileInfo, Listing, RemoteMetadata};
use crate::error::{DbxError, DbxResult};
use crate::operations::{CopyOptions, ListOptions, OpenMode};
use crate::path::normalize;
use crate::reader::RemoteReader;
use crate::sink::{DiagnosticSink, TracingSink};
use crate::writer::RemoteWriter;

/// Default upload block size (4 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Default read-ahead window (5 MiB)
pub const DEFAULT_READ_AHEAD: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FsConfig {
    pub block_size: usize,
    pub read_ahead: u64,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, read_ahead: DEFAULT_READ_AHEAD }
    }
}

/// An open remote file
pub enum RemoteFile<C: RemoteClient + ?Sized> {
    Reader(RemoteReader<C>),
    Writer(RemoteWriter<C>),
}

pub struct RemoteFileSystem<C: RemoteClient + ?Sized> {
    client: Arc<C>,
    sink: Arc<dyn DiagnosticSink>,
    config: FsConfig,
}

impl<C: RemoteClient + ?Sized> RemoteFileSystem<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_sink(client, Arc::new(TracingSink))
    }

    pub fn with_sink(client: Arc<C>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { client, sink, config: FsConfig::default() }
    }

    pub fn with_config(mut self, config: FsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    async fn list_all(&self, path: &str, recursive: bool) -> DbxResult<Vec<RemoteMetadata>> {
        let mut page = self.client.list_folder(path, recursive).await?;
        let mut entries = std::mem::take(&mut page.entries);
        while page.has_more {
            page = self.client.list_folder_continue(&page.cursor).await?;
            entries.append(&mut page.entries);
        }
        Ok(entries)
    }

    /// Entries under `path`, every page concatenated in order. Without
    /// `detail` only display paths come back.
    pub async fn ls(&self, path: &str, options: &ListOptions) -> Option<Listing> {
        let path = normalize(path);
        match self.list_all(&path, options.recursive).await {
            Ok(entries) => Some(Listing::from_metadata(&entries, options.detail)),
            Err(e) => {
                self.sink.warn("ls", &path, &e);
                None
            }
        }
    }

    /// Like [`ls`](Self::ls) without detail: display paths only.
    pub async fn ls_names(&self, path: &str, recursive: bool) -> Option<Vec<String>> {
        let options = ListOptions { recursive, detail: false };
        match self.ls(path, &options).await? {
            Listing::Names(names) => Some(names),
            Listing::Detailed(infos) => Some(infos.into_iter().map(|i| i.name).collect()),
        }
    }

    pub async fn info(&self, path: &str) -> Option<FileInfo> {
        match self.client.get_metadata(path).await {
            Ok(metadata) => Some(FileInfo::from_metadata(&metadata)),
            Err(e) => {
                self.sink.warn("info", path, &e);
                None
            }
        }
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.client.exists(path).await
    }

    pub async fn isdir(&self, path: &str) -> bool {
        matches!(self.client.get_metadata(path).await, Ok(m) if m.is_folder())
    }

    pub async fn isfile(&self, path: &str) -> bool {
        matches!(self.client.get_metadata(path).await, Ok(m) if m.is_file())
    }

    pub async fn size(&self, path: &str) -> Option<u64> {
        self.info(path).await.and_then(|i| i.size)
    }

    pub async fn mkdir(&self, path: &str) -> Option<FileInfo> {
        match self.client.create_folder(path).await {
            Ok(metadata) => {
                let info = FileInfo::from_metadata(&metadata);
                self.sink.info(&format!("The {} {} has been created.", info.kind_label(), info.name));
                Some(info)
            }
            Err(e) => {
                self.sink.warn("mkdir", path, &e);
                None
            }
        }
    }

    /// Remove a file or a whole folder in one remote call.
    pub async fn rm(&self, path: &str) -> Option<FileInfo> {
        match self.client.delete(path).await {
            Ok(metadata) => {
                let info = FileInfo::from_metadata(&metadata);
                self.sink.info(&format!("The {} {} has been erased.", info.kind_label(), info.name));
                Some(info)
            }
            Err(e) => {
                self.sink.warn("rm", path, &e);
                None
            }
        }
    }

    /// Resolve a copy request without executing it. May still delete an
    /// existing folder destination, see [`CopyResolver`].
    pub async fn plan_copy(
        &self,
        source: impl Into<CopySource>,
        destination: &str,
        options: &CopyOptions,
    ) -> DbxResult<CopyPlan> {
        CopyResolver::new(self.client.as_ref(), self.sink.as_ref())
            .resolve(&source.into(), destination, options)
            .await
    }

    /// Run a plan from [`plan_copy`](Self::plan_copy) under its own policy.
    pub async fn execute_copy(&self, plan: &CopyPlan) -> DbxResult<usize> {
        CopyExecutor::new(self.client.as_ref(), self.sink.as_ref())
            .execute(plan)
            .await
    }

    /// Copy with `cp` semantics. Returns the number of objects copied.
    pub async fn cp(
        &self,
        source: impl Into<CopySource>,
        destination: &str,
        options: &CopyOptions,
    ) -> DbxResult<usize> {
        copy::copy(self.client.as_ref(), self.sink.as_ref(), &source.into(), destination, options).await
    }

    pub async fn open(&self, path: &str, mode: &str) -> DbxResult<RemoteFile<C>> {
        match mode.parse::<OpenMode>()? {
            OpenMode::Read => Ok(RemoteFile::Reader(self.open_read(path).await?)),
            mode => Ok(RemoteFile::Writer(self.open_write(path, mode)?)),
        }
    }

    pub async fn open_read(&self, path: &str) -> DbxResult<RemoteReader<C>> {
        let path = normalize(path);
        let link = self.client.get_temporary_link(&path).await?;
        let metadata = self.client.get_metadata(&path).await?;
        let size = match FileInfo::from_metadata(&metadata) {
            FileInfo { size: Some(size), .. } => size,
            _ => return Err(DbxError::InvalidPath(format!("not a file: {path}"))),
        };
        Ok(RemoteReader::new(self.client.clone(), path, link, size, self.config.read_ahead))
    }

    pub fn open_write(&self, path: &str, mode: OpenMode) -> DbxResult<RemoteWriter<C>> {
        RemoteWriter::new(self.client.clone(), normalize(path), mode, self.config.block_size)
    }

    /// Whole contents of a remote file.
    pub async fn cat(&self, path: &str) -> DbxResult<Bytes> {
        self.open_read(path).await?.read_to_end().await
    }

    /// Replace a remote file with `data`.
    pub async fn pipe(&self, path: &str, data: &[u8]) -> DbxResult<Option<FileInfo>> {
        let mut writer = self.open_write(path, OpenMode::Write)?;
        writer.write(data).await?;
        writer.close().await
    }
}
