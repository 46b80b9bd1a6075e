use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::{DirEntry, FileMode};
use crate::error::{FsError, FsResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// How a file is opened by the host.
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub truncate: bool,
}

impl OpenMode {
    pub const fn read() -> Self {
        Self {
            read: true,
            write: false,
            truncate: false,
        }
    }

    pub const fn write() -> Self {
        Self {
            read: false,
            write: true,
            truncate: false,
        }
    }

    pub const fn write_truncate() -> Self {
        Self {
            read: false,
            write: true,
            truncate: true,
        }
    }

    pub const fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            truncate: false,
        }
    }
}

/// A file node produced by `View::walk`.
#[async_trait]
pub trait File: Send + Sync {
    fn name(&self) -> &str;
    fn mode(&self) -> FileMode;
    async fn open(&self, mode: OpenMode) -> FsResult<Box<dyn FileHandle>>;
}

/// One open/read/write/close cycle on a file.
///
/// The host must end every session with exactly one of `commit` (the final
/// close) or `abort` (client went away). Dropping a session aborts it.
#[async_trait]
pub trait FileHandle: Send {
    async fn read_at(&mut self, offset: u64, len: usize) -> FsResult<Vec<u8>>;
    async fn write_at(&mut self, offset: u64, data: &[u8]) -> FsResult<usize>;
    async fn commit(self: Box<Self>) -> FsResult<()>;

    fn abort(self: Box<Self>) {}
}

/// Directory behaviour of one resource kind.
///
/// `walk` returns `Ok(None)` for a name that has no such child; errors are
/// reserved for failures while looking it up.
#[async_trait]
pub trait View: Send + Sync {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>>;
    async fn list(&self) -> FsResult<Vec<DirEntry>>;

    async fn remove(&self, name: &str) -> FsResult<()> {
        Err(FsError::PermissionDenied(format!("cannot remove '{name}'")))
    }
}

#[derive(Clone)]
/// A named directory whose children are produced by a view.
pub struct Directory {
    name: String,
    mode: FileMode,
    view: Arc<dyn View>,
}

impl Directory {
    pub fn new(name: &str, mode: FileMode, view: Arc<dyn View>) -> Self {
        Self {
            name: name.to_string(),
            mode,
            view,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        self.view.walk(name).await
    }

    pub async fn list(&self) -> FsResult<Vec<DirEntry>> {
        self.view.list().await
    }

    pub async fn remove(&self, name: &str) -> FsResult<()> {
        self.view.remove(name).await
    }
}

#[derive(Clone)]
pub enum Node {
    Dir(Directory),
    File(Arc<dyn File>),
}

impl Node {
    /// Wraps a view in a directory node.
    pub fn dir(name: &str, mode: FileMode, view: impl View + 'static) -> Self {
        Self::Dir(Directory::new(name, mode, Arc::new(view)))
    }

    pub fn file(file: impl File + 'static) -> Self {
        Self::File(Arc::new(file))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Dir(dir) => dir.name(),
            Self::File(file) => file.name(),
        }
    }

    pub fn mode(&self) -> FileMode {
        match self {
            Self::Dir(dir) => dir.mode(),
            Self::File(file) => file.mode(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir(_))
    }

    pub fn entry(&self) -> DirEntry {
        DirEntry::new(self.name(), self.mode())
    }

    pub fn as_dir(&self) -> FsResult<&Directory> {
        match self {
            Self::Dir(dir) => Ok(dir),
            Self::File(file) => Err(FsError::NotADirectory(file.name().to_string())),
        }
    }

    pub fn as_file(&self) -> FsResult<&Arc<dyn File>> {
        match self {
            Self::File(file) => Ok(file),
            Self::Dir(dir) => Err(FsError::IsADirectory(dir.name().to_string())),
        }
    }
}
