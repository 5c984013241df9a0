//! In-memory remote used by the unit tests

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::client::{CommitInfo, ListFolderPage, RemoteClient, UploadSessionCursor, WriteMode};
use crate::entry::RemoteMetadata;
use crate::error::{DbxError, DbxResult};
use crate::sink::DiagnosticSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListFolder(String, bool),
    ListFolderContinue(String),
    GetMetadata(String),
    CreateFolder(String),
    Delete(String),
    Copy(String, String),
    GetTemporaryLink(String),
    DownloadRange(u64, u64),
    SessionStart,
    SessionAppend(String, u64, usize),
    SessionFinish(String, u64, usize, CommitInfo),
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Folder,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    calls: Vec<Call>,
    sessions: HashMap<String, Vec<u8>>,
    next_session: u64,
    failing_copies: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_appends: usize,
    failing_finishes: usize,
}

pub struct FakeClient {
    state: Mutex<State>,
    page_size: usize,
}

fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

fn is_within(path: &str, root: &str) -> bool {
    path == root || path.starts_with(&format!("{}/", root))
}

impl FakeClient {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()), page_size: 1000 }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            Self::ensure_parents(&mut state, path);
            state.nodes.insert(path.to_string(), Node::File(data.to_vec()));
        }
        self
    }

    pub fn with_folder(self, path: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            Self::ensure_parents(&mut state, path);
            state.nodes.insert(path.to_string(), Node::Folder);
        }
        self
    }

    /// Make every copy whose source is `path` fail.
    pub fn fail_copy_from(self, path: &str) -> Self {
        self.state.lock().unwrap().failing_copies.insert(path.to_string());
        self
    }

    pub fn fail_delete_of(self, path: &str) -> Self {
        self.state.lock().unwrap().failing_deletes.insert(path.to_string());
        self
    }

    /// Refuse the next upload session append.
    pub fn fail_append_once(self) -> Self {
        self.state.lock().unwrap().failing_appends += 1;
        self
    }

    /// Refuse the next upload session finish, keeping the session open.
    pub fn fail_finish_once(self) -> Self {
        self.state.lock().unwrap().failing_finishes += 1;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn copies(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Copy(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn has(&self, path: &str) -> bool {
        self.state.lock().unwrap().nodes.contains_key(path)
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    fn ensure_parents(state: &mut State, path: &str) {
        let mut current = parent_of(path);
        while let Some(parent) = current {
            state.nodes.entry(parent.to_string()).or_insert(Node::Folder);
            current = parent_of(parent);
        }
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn metadata_for(path: &str, node: &Node) -> RemoteMetadata {
        match node {
            Node::File(data) => RemoteMetadata::file(path, data.len() as u64),
            Node::Folder => RemoteMetadata::folder(path),
        }
    }

    fn page_from(&self, entries: &[RemoteMetadata], start: usize) -> ListFolderPage {
        let end = (start + self.page_size).min(entries.len());
        ListFolderPage {
            entries: entries[start..end].to_vec(),
            cursor: end.to_string(),
            has_more: end < entries.len(),
        }
    }

    fn listing(state: &State, root: &str, recursive: bool) -> Vec<RemoteMetadata> {
        state
            .nodes
            .iter()
            .filter(|(path, _)| {
                let inside = root.is_empty() || path.starts_with(&format!("{}/", root));
                inside && (recursive || parent_of(path).unwrap_or("") == root)
            })
            .map(|(path, node)| Self::metadata_for(path, node))
            .collect()
    }
}

#[async_trait]
impl RemoteClient for FakeClient {
    async fn list_folder(&self, path: &str, recursive: bool) -> DbxResult<ListFolderPage> {
        self.record(Call::ListFolder(path.to_string(), recursive));
        let entries = {
            let state = self.state.lock().unwrap();
            if !path.is_empty() && !matches!(state.nodes.get(path), Some(Node::Folder)) {
                return Err(DbxError::NotFound(path.to_string()));
            }
            Self::listing(&state, path, recursive)
        };
        // The cursor encodes "<path>|<recursive>|<offset>".
        let mut page = self.page_from(&entries, 0);
        page.cursor = format!("{}|{}|{}", path, recursive, page.cursor);
        Ok(page)
    }

    async fn list_folder_continue(&self, cursor: &str) -> DbxResult<ListFolderPage> {
        self.record(Call::ListFolderContinue(cursor.to_string()));
        let mut parts = cursor.splitn(3, '|');
        let path = parts.next().unwrap_or_default().to_string();
        let recursive = parts.next() == Some("true");
        let offset: usize = parts
            .next()
            .and_then(|o| o.parse().ok())
            .ok_or_else(|| DbxError::Other(format!("bad cursor: {cursor}")))?;
        let entries = Self::listing(&self.state.lock().unwrap(), &path, recursive);
        let mut page = self.page_from(&entries, offset);
        page.cursor = format!("{}|{}|{}", path, recursive, page.cursor);
        Ok(page)
    }

    async fn get_metadata(&self, path: &str) -> DbxResult<RemoteMetadata> {
        self.record(Call::GetMetadata(path.to_string()));
        if path.is_empty() {
            return Ok(RemoteMetadata::folder("/"));
        }
        let state = self.state.lock().unwrap();
        state
            .nodes
            .get(path)
            .map(|node| Self::metadata_for(path, node))
            .ok_or_else(|| DbxError::NotFound(path.to_string()))
    }

    async fn create_folder(&self, path: &str) -> DbxResult<RemoteMetadata> {
        self.record(Call::CreateFolder(path.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(path) {
            return Err(DbxError::Conflict(path.to_string()));
        }
        Self::ensure_parents(&mut state, path);
        state.nodes.insert(path.to_string(), Node::Folder);
        Ok(RemoteMetadata::folder(path))
    }

    async fn delete(&self, path: &str) -> DbxResult<RemoteMetadata> {
        self.record(Call::Delete(path.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(path) {
            return Err(DbxError::ProviderApi { provider: "fake".into(), message: "delete refused".into() });
        }
        let node = state
            .nodes
            .get(path)
            .cloned()
            .ok_or_else(|| DbxError::NotFound(path.to_string()))?;
        state.nodes.retain(|p, _| !is_within(p, path));
        Ok(Self::metadata_for(path, &node))
    }

    async fn copy(&self, from: &str, to: &str) -> DbxResult<RemoteMetadata> {
        self.record(Call::Copy(from.to_string(), to.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.failing_copies.contains(from) {
            return Err(DbxError::ProviderApi { provider: "fake".into(), message: "copy refused".into() });
        }
        let node = state
            .nodes
            .get(from)
            .cloned()
            .ok_or_else(|| DbxError::NotFound(from.to_string()))?;
        if state.nodes.contains_key(to) {
            return Err(DbxError::AlreadyExists(to.to_string()));
        }
        let subtree: Vec<(String, Node)> = state
            .nodes
            .iter()
            .filter(|(p, _)| is_within(p, from))
            .map(|(p, n)| (format!("{}{}", to, &p[from.len()..]), n.clone()))
            .collect();
        Self::ensure_parents(&mut state, to);
        state.nodes.extend(subtree);
        Ok(Self::metadata_for(to, &node))
    }

    async fn get_temporary_link(&self, path: &str) -> DbxResult<String> {
        self.record(Call::GetTemporaryLink(path.to_string()));
        match self.state.lock().unwrap().nodes.get(path) {
            Some(Node::File(_)) => Ok(format!("fake://{}", path)),
            _ => Err(DbxError::NotFound(path.to_string())),
        }
    }

    async fn download_range(&self, link: &str, start: u64, end: u64) -> DbxResult<Bytes> {
        self.record(Call::DownloadRange(start, end));
        let path = link.trim_start_matches("fake://");
        let data = self
            .contents(path)
            .ok_or_else(|| DbxError::NotFound(path.to_string()))?;
        let end = (end as usize).min(data.len());
        let start = (start as usize).min(end);
        Ok(Bytes::copy_from_slice(&data[start..end]))
    }

    async fn upload_session_start(&self) -> DbxResult<String> {
        self.record(Call::SessionStart);
        let mut state = self.state.lock().unwrap();
        state.next_session += 1;
        let id = format!("session-{}", state.next_session);
        state.sessions.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn upload_session_append(&self, data: Bytes, cursor: &UploadSessionCursor) -> DbxResult<()> {
        self.record(Call::SessionAppend(cursor.session_id.clone(), cursor.offset, data.len()));
        let mut state = self.state.lock().unwrap();
        if state.failing_appends > 0 {
            state.failing_appends -= 1;
            return Err(DbxError::Network("append interrupted".into()));
        }
        let buffer = state
            .sessions
            .get_mut(&cursor.session_id)
            .ok_or_else(|| DbxError::NotFound(cursor.session_id.clone()))?;
        if buffer.len() as u64 != cursor.offset {
            return Err(DbxError::Conflict(format!("incorrect offset {}", cursor.offset)));
        }
        buffer.extend_from_slice(&data);
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Bytes,
        cursor: &UploadSessionCursor,
        commit: &CommitInfo,
    ) -> DbxResult<RemoteMetadata> {
        self.record(Call::SessionFinish(
            cursor.session_id.clone(),
            cursor.offset,
            data.len(),
            commit.clone(),
        ));
        let mut state = self.state.lock().unwrap();
        if state.failing_finishes > 0 {
            state.failing_finishes -= 1;
            return Err(DbxError::Network("finish interrupted".into()));
        }
        let mut buffer = state
            .sessions
            .remove(&cursor.session_id)
            .ok_or_else(|| DbxError::NotFound(cursor.session_id.clone()))?;
        if buffer.len() as u64 != cursor.offset {
            return Err(DbxError::Conflict(format!("incorrect offset {}", cursor.offset)));
        }
        buffer.extend_from_slice(&data);

        let mut target = commit.path.clone();
        if commit.mode == WriteMode::Add && state.nodes.contains_key(&target) {
            if !commit.autorename {
                return Err(DbxError::Conflict(target));
            }
            let mut n = 1;
            while state.nodes.contains_key(&format!("{} ({})", commit.path, n)) {
                n += 1;
            }
            target = format!("{} ({})", commit.path, n);
        }
        let size = buffer.len() as u64;
        Self::ensure_parents(&mut state, &target);
        state.nodes.insert(target.clone(), Node::File(buffer));
        Ok(RemoteMetadata::file(target, size))
    }
}

/// Keeps every report for inspection
#[derive(Default)]
pub struct RecordingSink {
    pub infos: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, operation: &str, path: &str, _error: &DbxError) {
        self.warnings
            .lock()
            .unwrap()
            .push((operation.to_string(), path.to_string()));
    }
}
