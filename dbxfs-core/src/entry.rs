//! Remote entries and their caller-facing shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata as returned by the remote client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteMetadata {
    File {
        path_display: String,
        size: u64,
        server_modified: Option<DateTime<Utc>>,
        rev: Option<String>,
        content_hash: Option<String>,
    },
    Folder {
        path_display: String,
    },
    Other {
        path_display: String,
    },
}

impl RemoteMetadata {
    pub fn file(path_display: impl Into<String>, size: u64) -> Self {
        RemoteMetadata::File {
            path_display: path_display.into(),
            size,
            server_modified: None,
            rev: None,
            content_hash: None,
        }
    }

    pub fn folder(path_display: impl Into<String>) -> Self {
        RemoteMetadata::Folder { path_display: path_display.into() }
    }

    pub fn path_display(&self) -> &str {
        match self {
            RemoteMetadata::File { path_display, .. }
            | RemoteMetadata::Folder { path_display }
            | RemoteMetadata::Other { path_display } => path_display,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, RemoteMetadata::File { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, RemoteMetadata::Folder { .. })
    }
}

/// Entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// `{name, size, type}` view of a remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub kind: Option<EntryKind>,
}

impl FileInfo {
    /// Size is only carried for files; unrecognized entries have no type.
    pub fn from_metadata(metadata: &RemoteMetadata) -> Self {
        match metadata {
            RemoteMetadata::File { path_display, size, .. } => Self {
                name: path_display.clone(),
                size: Some(*size),
                kind: Some(EntryKind::File),
            },
            RemoteMetadata::Folder { path_display } => Self {
                name: path_display.clone(),
                size: None,
                kind: Some(EntryKind::Directory),
            },
            RemoteMetadata::Other { path_display } => Self {
                name: path_display.clone(),
                size: None,
                kind: None,
            },
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == Some(EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        self.kind == Some(EntryKind::Directory)
    }

    /// Human label used in log lines, empty when the type is unknown.
    pub fn kind_label(&self) -> &'static str {
        self.kind.map(|k| k.as_str()).unwrap_or("")
    }
}

impl From<&RemoteMetadata> for FileInfo {
    fn from(metadata: &RemoteMetadata) -> Self {
        FileInfo::from_metadata(metadata)
    }
}

/// Result of a listing: full records, or display paths only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Detailed(Vec<FileInfo>),
    Names(Vec<String>),
}

impl Listing {
    pub fn from_metadata(entries: &[RemoteMetadata], detail: bool) -> Self {
        if detail {
            Listing::Detailed(entries.iter().map(FileInfo::from_metadata).collect())
        } else {
            Listing::Names(entries.iter().map(|e| e.path_display().to_string()).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Listing::Detailed(infos) => infos.len(),
            Listing::Names(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Listing::Detailed(infos) => infos.iter().map(|i| i.name.as_str()).collect(),
            Listing::Names(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_without_detail_has_names_only() {
        let entries = vec![RemoteMetadata::file("/a.txt", 3), RemoteMetadata::folder("/b")];

        let names = Listing::from_metadata(&entries, false);
        assert_eq!(names, Listing::Names(vec!["/a.txt".into(), "/b".into()]));
        assert_eq!(serde_json::to_value(&names).unwrap(), serde_json::json!(["/a.txt", "/b"]));

        let detailed = Listing::from_metadata(&entries, true);
        assert!(matches!(&detailed, Listing::Detailed(infos) if infos[0].size == Some(3)));
        assert_eq!(detailed.names(), vec!["/a.txt", "/b"]);
        assert_eq!(detailed.len(), 2);
    }

    #[test]
    fn test_info_file() {
        let info = FileInfo::from_metadata(&RemoteMetadata::file("file1.txt", 20));
        assert_eq!(info.name, "file1.txt");
        assert_eq!(info.size, Some(20));
        assert_eq!(info.kind, Some(EntryKind::File));
    }

    #[test]
    fn test_info_folder() {
        let info = FileInfo::from_metadata(&RemoteMetadata::folder("files"));
        assert_eq!(info.name, "files");
        assert_eq!(info.size, None);
        assert_eq!(info.kind, Some(EntryKind::Directory));
    }

    #[test]
    fn test_info_unrecognized() {
        let info = FileInfo::from_metadata(&RemoteMetadata::Other {
            path_display: "file1.txt".into(),
        });
        assert_eq!(info.name, "file1.txt");
        assert_eq!(info.size, None);
        assert_eq!(info.kind, None);
        assert_eq!(info.kind_label(), "");
    }

    #[test]
    fn test_serialized_shape() {
        let info = FileInfo::from_metadata(&RemoteMetadata::file("/a/b.txt", 7));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "/a/b.txt");
        assert_eq!(json["size"], 7);
        assert_eq!(json["type"], "file");

        let info = FileInfo::from_metadata(&RemoteMetadata::Other { path_display: "x".into() });
        let json = serde_json::to_value(&info).unwrap();
        assert!(json["type"].is_null());
        assert!(json["size"].is_null());
    }
}
