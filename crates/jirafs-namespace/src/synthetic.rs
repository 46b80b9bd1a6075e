use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::entry::FileMode;
use crate::error::{FsError, FsResult};
use crate::node::{File, FileHandle, OpenMode};

#[derive(Clone)]
/// In-memory file backed by a shared byte buffer.
///
/// Clones share the buffer, so a handle opened on a clone observes writes
/// made through any other clone.
pub struct SyntheticFile {
    name: String,
    mode: FileMode,
    content: Arc<RwLock<Vec<u8>>>,
}

impl SyntheticFile {
    pub fn new(name: &str, mode: FileMode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            content: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_content(name: &str, mode: FileMode, content: impl Into<Vec<u8>>) -> Self {
        let file = Self::new(name, mode);
        file.set_content(content);
        file
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.content
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.content
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_content(&self, content: impl Into<Vec<u8>>) {
        *self.write_guard() = content.into();
    }

    /// Snapshot of the whole buffer.
    pub fn content(&self) -> Vec<u8> {
        self.read_guard().clone()
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&self) {
        self.write_guard().clear();
    }

    pub fn read_at(&self, offset: u64, len: usize) -> Vec<u8> {
        let content = self.read_guard();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = start.saturating_add(len).min(content.len());
        content[start..end].to_vec()
    }

    /// Writes `data` at `offset`, zero-filling any gap past the current end.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> FsResult<usize> {
        let start = usize::try_from(offset)
            .map_err(|_| FsError::InvalidInput(format!("write offset {offset} out of range")))?;
        let end = start
            .checked_add(data.len())
            .ok_or_else(|| FsError::InvalidInput(format!("write offset {offset} out of range")))?;
        let mut content = self.write_guard();
        if content.len() < end {
            content.resize(end, 0);
        }
        content[start..end].copy_from_slice(data);
        Ok(data.len())
    }

    pub(crate) fn check_open(&self, mode: OpenMode) -> FsResult<()> {
        if mode.write && !self.mode.is_writable() {
            return Err(FsError::PermissionDenied(format!(
                "'{}' is read-only",
                self.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl File for SyntheticFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> FileMode {
        self.mode
    }

    async fn open(&self, mode: OpenMode) -> FsResult<Box<dyn FileHandle>> {
        self.check_open(mode)?;
        if mode.write && mode.truncate {
            self.truncate();
        }
        Ok(Box::new(BufferHandle {
            file: self.clone(),
            mode,
        }))
    }
}

struct BufferHandle {
    file: SyntheticFile,
    mode: OpenMode,
}

#[async_trait]
impl FileHandle for BufferHandle {
    async fn read_at(&mut self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        Ok(self.file.read_at(offset, len))
    }

    async fn write_at(&mut self, offset: u64, data: &[u8]) -> FsResult<usize> {
        if !self.mode.write {
            return Err(FsError::PermissionDenied(format!(
                "'{}' was not opened for writing",
                self.file.name
            )));
        }
        self.file.write_at(offset, data)
    }

    async fn commit(self: Box<Self>) -> FsResult<()> {
        Ok(())
    }
}
