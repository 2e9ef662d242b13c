//! Real filesystem backed by `tokio::fs`.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::core::OperationError;
use crate::ops::{FileStat, FileSystem, WriteMode};

/// Operation provider that talks to the OS.
///
/// `EMFILE` surfaces as an `io::Error` with the raw OS code, which the
/// dispatcher classifies as exhaustion.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OperationError> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), OperationError> {
        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            WriteMode::Truncate => options.create(true).truncate(true),
            WriteMode::Append => options.create(true).append(true),
            WriteMode::CreateNew => options.create_new(true),
        };
        let mut file = options.open(path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, OperationError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, OperationError> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> Result<FileStat, OperationError> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileStat::from(&meta))
    }
}
