//! dbxfs core
//!
//! Filesystem-style access to a remote store: listing, metadata, folders,
//! buffered reads and writes, and copying with `cp` semantics.

pub mod client;
pub mod copy;
pub mod entry;
pub mod error;
pub mod fs;
pub mod operations;
pub mod path;
pub mod reader;
pub mod sink;
pub mod writer;

#[cfg(test)]
mod testing;

pub use client::RemoteClient;
pub use copy::{CopyInstruction, CopyPlan, CopySource};
pub use entry::{EntryKind, FileInfo, Listing, RemoteMetadata};
pub use error::{DbxError, DbxResult};
pub use fs::{FsConfig, RemoteFile, RemoteFileSystem};
pub use operations::{CopyOptions, ErrorPolicy, ListOptions, OpenMode};
pub use sink::{DiagnosticSink, TracingSink};
