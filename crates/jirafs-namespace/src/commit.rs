use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::entry::FileMode;
use crate::error::FsResult;
use crate::node::{File, FileHandle, OpenMode};
use crate::synthetic::SyntheticFile;

/// Receives the final buffer of a write session.
#[async_trait]
pub trait CommitHandler: Send + Sync {
    async fn commit(&self, content: Vec<u8>) -> FsResult<()>;
}

#[async_trait]
impl<F, Fut> CommitHandler for F
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FsResult<()>> + Send + 'static,
{
    async fn commit(&self, content: Vec<u8>) -> FsResult<()> {
        (self)(content).await
    }
}

#[derive(Clone)]
/// Synthetic file whose write sessions hand their final contents to a
/// commit handler when closed.
pub struct CommitFile {
    file: SyntheticFile,
    on_commit: Arc<dyn CommitHandler>,
    force_trunc: bool,
}

impl CommitFile {
    pub fn new(file: SyntheticFile, on_commit: impl CommitHandler + 'static) -> Self {
        Self {
            file,
            on_commit: Arc::new(on_commit),
            force_trunc: false,
        }
    }

    /// Makes the first write of every session discard the seeded content.
    pub fn force_trunc(mut self, force_trunc: bool) -> Self {
        self.force_trunc = force_trunc;
        self
    }
}

#[async_trait]
impl File for CommitFile {
    fn name(&self) -> &str {
        self.file.name()
    }

    fn mode(&self) -> FileMode {
        self.file.mode()
    }

    async fn open(&self, mode: OpenMode) -> FsResult<Box<dyn FileHandle>> {
        self.file.check_open(mode)?;
        if mode.write && mode.truncate {
            self.file.truncate();
        }
        Ok(Box::new(CommitHandle {
            file: self.file.clone(),
            on_commit: Arc::clone(&self.on_commit),
            writing: mode.write,
            pending_trunc: mode.write && self.force_trunc,
        }))
    }
}

struct CommitHandle {
    file: SyntheticFile,
    on_commit: Arc<dyn CommitHandler>,
    writing: bool,
    pending_trunc: bool,
}

#[async_trait]
impl FileHandle for CommitHandle {
    async fn read_at(&mut self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        Ok(self.file.read_at(offset, len))
    }

    async fn write_at(&mut self, offset: u64, data: &[u8]) -> FsResult<usize> {
        if !self.writing {
            return Err(crate::error::FsError::PermissionDenied(format!(
                "'{}' was not opened for writing",
                self.file.name()
            )));
        }
        if self.pending_trunc {
            self.file.truncate();
            self.pending_trunc = false;
        }
        self.file.write_at(offset, data)
    }

    async fn commit(self: Box<Self>) -> FsResult<()> {
        if !self.writing {
            return Ok(());
        }
        debug!(file = self.file.name(), "committing write session");
        self.on_commit.commit(self.file.content()).await
    }
}
