//! Range-addressed reads over a temporary link

use bytes::{Bytes, BytesMut};
use std::io::SeekFrom;
use std::sync::Arc;

use crate::client::RemoteClient;
use crate::error::{DbxError, DbxResult};

/// Read-ahead block cache
///
/// Holds one contiguous window of the object. A miss fetches the requested
/// range plus `block_size` bytes beyond it, clamped to the object size.
#[derive(Debug)]
pub struct ReadAheadCache {
    block_size: u64,
    size: u64,
    start: u64,
    end: u64,
    data: Bytes,
    fetches: usize,
}

impl ReadAheadCache {
    pub fn new(block_size: u64, size: u64) -> Self {
        Self { block_size, size, start: 0, end: 0, data: Bytes::new(), fetches: 0 }
    }

    /// Number of remote fetches issued so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub async fn fetch<C: RemoteClient + ?Sized>(
        &mut self,
        client: &C,
        link: &str,
        start: u64,
        end: u64,
    ) -> DbxResult<Bytes> {
        let end = end.min(self.size);
        if start >= self.size || start >= end {
            return Ok(Bytes::new());
        }

        if start >= self.start && end <= self.end {
            let from = (start - self.start) as usize;
            let to = (end - self.start) as usize;
            return Ok(self.data.slice(from..to));
        }

        // Reuse the cached head of a partially covered range.
        let (part, fetch_start) = if self.start <= start && start < self.end {
            (self.data.slice((start - self.start) as usize..), self.end)
        } else {
            (Bytes::new(), start)
        };
        let wanted = (end - fetch_start) as usize;
        let fetch_end = (end + self.block_size).min(self.size);

        self.data = client.download_range(link, fetch_start, fetch_end).await?;
        self.fetches += 1;
        self.start = fetch_start;
        self.end = fetch_start + self.data.len() as u64;

        let tail = self.data.slice(..wanted.min(self.data.len()));
        if part.is_empty() {
            return Ok(tail);
        }
        let mut out = BytesMut::with_capacity(part.len() + tail.len());
        out.extend_from_slice(&part);
        out.extend_from_slice(&tail);
        Ok(out.freeze())
    }
}

/// Read handle on a remote file
pub struct RemoteReader<C: RemoteClient + ?Sized> {
    client: Arc<C>,
    path: String,
    link: String,
    size: u64,
    loc: u64,
    cache: ReadAheadCache,
}

impl<C: RemoteClient + ?Sized> RemoteReader<C> {
    pub(crate) fn new(client: Arc<C>, path: String, link: String, size: u64, block_size: u64) -> Self {
        Self {
            client,
            path,
            link,
            size,
            loc: 0,
            cache: ReadAheadCache::new(block_size, size),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn tell(&self) -> u64 {
        self.loc
    }

    pub fn cache(&self) -> &ReadAheadCache {
        &self.cache
    }

    pub fn seek(&mut self, pos: SeekFrom) -> DbxResult<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(n) => self.loc as i128 + n as i128,
            SeekFrom::End(n) => self.size as i128 + n as i128,
        };
        if target < 0 {
            return Err(DbxError::InvalidSeek(format!("{} before start of {}", target, self.path)));
        }
        self.loc = target as u64;
        Ok(self.loc)
    }

    /// Read up to `length` bytes; `None` reads to the end.
    pub async fn read(&mut self, length: Option<u64>) -> DbxResult<Bytes> {
        let remaining = self.size.saturating_sub(self.loc);
        let length = length.map_or(remaining, |n| n.min(remaining));
        if length == 0 {
            return Ok(Bytes::new());
        }
        let out = self
            .cache
            .fetch(self.client.as_ref(), &self.link, self.loc, self.loc + length)
            .await?;
        self.loc += out.len() as u64;
        Ok(out)
    }

    pub async fn read_to_end(&mut self) -> DbxResult<Bytes> {
        self.read(None).await
    }
}
