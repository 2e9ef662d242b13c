//! Operations addressed by name, and their decoded results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{FileStat, FileSystem, WriteMode};
use crate::core::OperationError;

/// One filesystem call: its name plus arguments.
///
/// Serialized with an `op` tag, e.g. `{"op": "read_dir", "path": "/tmp"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Read a file.
    ReadFile {
        /// File to read.
        path: PathBuf,
    },
    /// Write a file.
    WriteFile {
        /// File to write.
        path: PathBuf,
        /// Bytes to write.
        data: Vec<u8>,
        /// Treatment of an existing file.
        #[serde(default)]
        mode: WriteMode,
    },
    /// Check for existence.
    Exists {
        /// Path to probe.
        path: PathBuf,
    },
    /// List a directory.
    ReadDir {
        /// Directory to list.
        path: PathBuf,
    },
    /// Fetch metadata.
    Stat {
        /// Path to inspect.
        path: PathBuf,
    },
}

impl Operation {
    /// Wire name of the operation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "read_file",
            Self::WriteFile { .. } => "write_file",
            Self::Exists { .. } => "exists",
            Self::ReadDir { .. } => "read_dir",
            Self::Stat { .. } => "stat",
        }
    }

    /// Run against a provider and decode the raw result into named fields.
    ///
    /// # Errors
    ///
    /// Returns whatever the provider reports.
    pub async fn apply<F>(&self, fs: &F) -> Result<OperationOutput, OperationError>
    where
        F: FileSystem + ?Sized,
    {
        match self {
            Self::ReadFile { path } => fs
                .read_file(path)
                .await
                .map(|data| OperationOutput::Data { data }),
            Self::WriteFile { path, data, mode } => fs
                .write_file(path, data, *mode)
                .await
                .map(|()| OperationOutput::Written),
            Self::Exists { path } => fs
                .exists(path)
                .await
                .map(|exists| OperationOutput::Exists { exists }),
            Self::ReadDir { path } => fs
                .read_dir(path)
                .await
                .map(|files| OperationOutput::Entries { files }),
            Self::Stat { path } => fs.stat(path).await.map(OperationOutput::Stat),
        }
    }
}

/// Decoded result of an [`Operation`].
///
/// Serializes to the bare named fields, e.g. `{"files": ["a", "b"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    /// File contents.
    Data {
        /// Bytes read.
        data: Vec<u8>,
    },
    /// Write finished.
    Written,
    /// Existence probe.
    Exists {
        /// Whether the path exists.
        exists: bool,
    },
    /// Directory listing.
    Entries {
        /// Entry names.
        files: Vec<String>,
    },
    /// Metadata.
    Stat(FileStat),
}
