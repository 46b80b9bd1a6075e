//! Namespace engine primitives for jirafs.
//!
//! Provides the directory/file node model walked by a filesystem host,
//! in-memory synthetic files, commit-on-close write sessions, command files,
//! and an in-process host that resolves paths over a tree of views.

pub mod command;
pub mod commit;
pub mod entry;
pub mod error;
pub mod host;
pub mod node;
pub mod synthetic;

pub use command::{CommandFile, CommandHandler};
pub use commit::{CommitFile, CommitHandler};
pub use entry::{strings_to_entries, DirEntry, FileMode, SERVICE_IDENTITY};
pub use error::{FsError, FsResult};
pub use host::{Namespace, WriteSession};
pub use node::{Directory, File, FileHandle, Node, OpenMode, View};
pub use synthetic::SyntheticFile;
