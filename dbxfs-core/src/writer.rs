//! Buffered writes through a chunked upload session

use bytes::{Bytes, BytesMut};
use std::sync::Arc;

use crate::client::{CommitInfo, RemoteClient, UploadSessionCursor, WriteMode};
use crate::entry::{FileInfo, RemoteMetadata};
use crate::error::{DbxError, DbxResult};
use crate::operations::OpenMode;

/// Write handle on a remote file
///
/// Bytes are buffered locally and shipped once the buffer reaches the block
/// size. The upload session is opened lazily at the first flush and
/// committed by [`RemoteWriter::close`]; nothing is visible remotely before.
pub struct RemoteWriter<C: RemoteClient + ?Sized> {
    client: Arc<C>,
    path: String,
    mode: OpenMode,
    block_size: usize,
    buffer: BytesMut,
    // bytes already handed to the session
    offset: u64,
    cursor: Option<UploadSessionCursor>,
    closed: bool,
}

impl<C: RemoteClient + ?Sized> RemoteWriter<C> {
    pub(crate) fn new(client: Arc<C>, path: String, mode: OpenMode, block_size: usize) -> DbxResult<Self> {
        if !mode.is_write() {
            return Err(DbxError::InvalidMode(format!("{:?}", mode)));
        }
        Ok(Self {
            client,
            path,
            mode,
            block_size,
            buffer: BytesMut::new(),
            offset: 0,
            cursor: None,
            closed: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Logical position: bytes uploaded plus bytes buffered.
    pub fn tell(&self) -> u64 {
        self.offset + self.buffer.len() as u64
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn commit_info(&self) -> CommitInfo {
        let mode = match self.mode {
            OpenMode::Append => WriteMode::Add,
            _ => WriteMode::Overwrite,
        };
        CommitInfo { path: self.path.clone(), mode, autorename: true }
    }

    pub async fn write(&mut self, data: &[u8]) -> DbxResult<usize> {
        if self.closed {
            return Err(DbxError::Closed(self.path.clone()));
        }
        self.buffer.extend_from_slice(data);
        if self.buffer.len() >= self.block_size {
            self.flush(false).await?;
        }
        Ok(data.len())
    }

    /// Ship the buffer if it is at least one block, or unconditionally when
    /// `force` is set.
    pub async fn flush(&mut self, force: bool) -> DbxResult<()> {
        if self.closed {
            return Err(DbxError::Closed(self.path.clone()));
        }
        if !force && self.buffer.len() < self.block_size {
            return Ok(());
        }
        self.upload_chunk(false).await.map(|_| ())
    }

    /// Commit the upload. Closing twice is a no-op.
    pub async fn close(&mut self) -> DbxResult<Option<FileInfo>> {
        if self.closed {
            return Ok(None);
        }
        let metadata = self.upload_chunk(true).await?;
        self.closed = true;
        Ok(metadata.as_ref().map(FileInfo::from_metadata))
    }

    async fn upload_chunk(&mut self, last: bool) -> DbxResult<Option<RemoteMetadata>> {
        let cursor = match self.cursor.take() {
            Some(cursor) => cursor,
            None => {
                let session_id = self.client.upload_session_start().await?;
                tracing::debug!(path = %self.path, session = %session_id, "upload session started");
                UploadSessionCursor { session_id, offset: self.offset }
            }
        };

        // The buffer is only released once the remote has taken the chunk.
        let chunk = Bytes::copy_from_slice(&self.buffer);
        let len = chunk.len() as u64;

        let result = if last {
            let commit = self.commit_info();
            self.client
                .upload_session_finish(chunk, &cursor, &commit)
                .await
                .map(Some)
        } else {
            self.client.upload_session_append(chunk, &cursor).await.map(|_| None)
        };

        match result {
            Ok(metadata) => {
                self.buffer.clear();
                self.offset += len;
                self.cursor = Some(UploadSessionCursor { offset: self.offset, ..cursor });
                Ok(metadata)
            }
            Err(e) => {
                self.cursor = Some(cursor);
                Err(e)
            }
        }
    }
}

impl<C: RemoteClient + ?Sized> Drop for RemoteWriter<C> {
    fn drop(&mut self) {
        if !self.closed && (self.cursor.is_some() || !self.buffer.is_empty()) {
            tracing::warn!(path = %self.path, pending = self.buffer.len(), "writer dropped without close; upload discarded");
        }
    }
}
