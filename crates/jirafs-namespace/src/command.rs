use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::entry::FileMode;
use crate::error::{FsError, FsResult};
use crate::node::{File, FileHandle, OpenMode};
use crate::synthetic::SyntheticFile;

/// Runs one command with the arguments that followed its name.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, args: Vec<String>) -> FsResult<()>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FsResult<()>> + Send + 'static,
{
    async fn run(&self, args: Vec<String>) -> FsResult<()> {
        (self)(args).await
    }
}

#[derive(Clone)]
/// A control file: every write is parsed as a command line and executed
/// immediately.
pub struct CommandFile {
    file: SyntheticFile,
    commands: Arc<BTreeMap<String, Arc<dyn CommandHandler>>>,
}

impl CommandFile {
    pub fn new(name: &str) -> Self {
        Self {
            file: SyntheticFile::new(name, FileMode::READ_WRITE),
            commands: Arc::new(BTreeMap::new()),
        }
    }

    pub fn command(mut self, name: &str, handler: impl CommandHandler + 'static) -> Self {
        Arc::make_mut(&mut self.commands).insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Parses `text` and dispatches it to the matching handler.
    pub async fn execute(&self, text: &str) -> FsResult<()> {
        let line = text.replace('\n', "");
        let mut tokens = line.split_whitespace().map(str::to_string);
        let Some(name) = tokens.next() else {
            return Err(FsError::InvalidInput(format!(
                "empty command written to '{}'",
                self.file.name()
            )));
        };
        let handler = self
            .commands
            .get(&name)
            .cloned()
            .ok_or_else(|| FsError::UnknownCommand(name.clone()))?;
        debug!(file = self.file.name(), command = %name, "executing command");
        handler.run(tokens.collect()).await
    }
}

#[async_trait]
impl File for CommandFile {
    fn name(&self) -> &str {
        self.file.name()
    }

    fn mode(&self) -> FileMode {
        self.file.mode()
    }

    async fn open(&self, mode: OpenMode) -> FsResult<Box<dyn FileHandle>> {
        self.file.check_open(mode)?;
        Ok(Box::new(CommandHandle {
            command: self.clone(),
            writing: mode.write,
        }))
    }
}

struct CommandHandle {
    command: CommandFile,
    writing: bool,
}

#[async_trait]
impl FileHandle for CommandHandle {
    async fn read_at(&mut self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        Ok(self.command.file.read_at(offset, len))
    }

    async fn write_at(&mut self, _offset: u64, data: &[u8]) -> FsResult<usize> {
        if !self.writing {
            return Err(FsError::PermissionDenied(format!(
                "'{}' was not opened for writing",
                self.command.file.name()
            )));
        }
        let text = String::from_utf8_lossy(data);
        self.command.execute(&text).await?;
        Ok(data.len())
    }

    async fn commit(self: Box<Self>) -> FsResult<()> {
        Ok(())
    }
}
