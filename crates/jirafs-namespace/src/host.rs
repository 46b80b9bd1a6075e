//! In-process host that drives the namespace the way a remote filesystem
//! server would: path resolution, listings, write sessions and removal.

use tracing::debug;

use crate::entry::DirEntry;
use crate::error::{FsError, FsResult};
use crate::node::{FileHandle, Node, OpenMode};

const READ_CHUNK: usize = 8192;

/// An open file. Exactly one of `commit` or `abort` ends it; dropping the
/// session aborts.
pub struct WriteSession {
    name: String,
    handle: Option<Box<dyn FileHandle>>,
}

impl WriteSession {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn handle(&mut self) -> FsResult<&mut Box<dyn FileHandle>> {
        self.handle
            .as_mut()
            .ok_or_else(|| FsError::InvalidInput(format!("session on '{}' is closed", self.name)))
    }

    pub async fn read(&mut self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        self.handle()?.read_at(offset, len).await
    }

    pub async fn write(&mut self, offset: u64, data: &[u8]) -> FsResult<usize> {
        self.handle()?.write_at(offset, data).await
    }

    /// Reads the whole file from offset zero.
    pub async fn read_to_end(&mut self) -> FsResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let chunk = self.read(out.len() as u64, READ_CHUNK).await?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Final close: runs the file's commit behaviour.
    pub async fn commit(mut self) -> FsResult<()> {
        match self.handle.take() {
            Some(handle) => handle.commit().await,
            None => Ok(()),
        }
    }

    pub fn abort(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(file = %self.name, "aborting unclosed session");
            handle.abort();
        }
    }
}

/// A namespace rooted at one directory node.
#[derive(Clone)]
pub struct Namespace {
    root: Node,
}

impl Namespace {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Walks one element from `node`. A missing child is `NotFound`.
    pub async fn walk(&self, node: &Node, name: &str) -> FsResult<Node> {
        let dir = node.as_dir()?;
        debug!(parent = dir.name(), child = name, "walk");
        dir.walk(name)
            .await?
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    /// Resolves a slash separated path from the root.
    pub async fn resolve(&self, path: &str) -> FsResult<Node> {
        self.resolve_from(&self.root, path).await
    }

    /// Resolves a relative path from `start`. Empty and `.` elements are
    /// ignored.
    pub async fn resolve_from(&self, start: &Node, path: &str) -> FsResult<Node> {
        let mut node = start.clone();
        for element in path_elements(path) {
            node = self.walk(&node, element).await?;
        }
        Ok(node)
    }

    pub async fn list(&self, node: &Node) -> FsResult<Vec<DirEntry>> {
        node.as_dir()?.list().await
    }

    pub async fn open(&self, node: &Node, mode: OpenMode) -> FsResult<WriteSession> {
        let file = node.as_file()?;
        let handle = file.open(mode).await?;
        Ok(WriteSession {
            name: file.name().to_string(),
            handle: Some(handle),
        })
    }

    pub async fn read_file(&self, node: &Node) -> FsResult<Vec<u8>> {
        let mut session = self.open(node, OpenMode::read()).await?;
        let content = session.read_to_end().await?;
        session.commit().await?;
        Ok(content)
    }

    /// Replaces the file contents in one session and commits it.
    pub async fn write_file(&self, node: &Node, data: &[u8]) -> FsResult<()> {
        let mut session = self.open(node, OpenMode::write_truncate()).await?;
        session.write(0, data).await?;
        session.commit().await
    }

    /// Appends to the seeded contents in one session and commits it.
    pub async fn append_file(&self, node: &Node, data: &[u8]) -> FsResult<()> {
        let mut session = self.open(node, OpenMode::read_write()).await?;
        let existing = session.read_to_end().await?;
        session.write(existing.len() as u64, data).await?;
        session.commit().await
    }

    /// Removes the last element of `path` (relative to `start`) from its
    /// parent directory.
    pub async fn remove_from(&self, start: &Node, path: &str) -> FsResult<()> {
        let elements: Vec<&str> = path_elements(path).collect();
        let Some((last, parents)) = elements.split_last() else {
            return Err(FsError::PermissionDenied("cannot remove the root".to_string()));
        };
        let mut parent = start.clone();
        for element in parents {
            parent = self.walk(&parent, element).await?;
        }
        parent.as_dir()?.remove(last).await
    }

    pub async fn remove(&self, path: &str) -> FsResult<()> {
        self.remove_from(&self.root, path).await
    }
}

fn path_elements(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|element| !element.is_empty() && *element != ".")
}
