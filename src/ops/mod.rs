//! Filesystem operations routed through a dispatcher.
//!
//! [`FileSystem`] is the operation provider: the set of named asynchronous
//! actions the dispatcher admits. [`FsQueue`] binds a provider to a
//! dispatcher and hands out [`PendingOperation`](crate::core::PendingOperation)s.

pub mod fs_queue;
pub mod operation;

use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::OperationError;

pub use fs_queue::FsQueue;
pub use operation::{Operation, OperationOutput};

/// How a write treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Create or replace the file.
    #[default]
    Truncate,
    /// Create the file or append to it.
    Append,
    /// Fail if the file already exists.
    CreateNew,
}

/// File metadata returned by [`FileSystem::stat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Size in bytes.
    pub len: u64,
    /// Regular file.
    pub is_file: bool,
    /// Directory.
    pub is_dir: bool,
    /// Write permission is absent.
    pub readonly: bool,
    /// Last modification, milliseconds since the unix epoch, when known.
    pub modified_ms: Option<u128>,
}

impl From<&Metadata> for FileStat {
    fn from(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            readonly: meta.permissions().readonly(),
            modified_ms: meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis()),
        }
    }
}

/// Named asynchronous filesystem actions.
///
/// Implementations report "too many open files" either as
/// [`OperationError::ResourceExhausted`] or as an `io::Error` carrying the OS
/// code; both make the dispatcher shrink its budget and retry.
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// Read a whole file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OperationError>;

    /// Write a whole file.
    async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), OperationError>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool, OperationError>;

    /// Names of the entries directly inside a directory.
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, OperationError>;

    /// Metadata for `path`.
    async fn stat(&self, path: &Path) -> Result<FileStat, OperationError>;
}
