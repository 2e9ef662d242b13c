//! Filesystem facade that queues every call behind a handle budget.

use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;

use super::{FileStat, FileSystem, Operation, OperationOutput, WriteMode};
use crate::core::{DispatchError, Dispatcher, OperationError, PendingOperation, Spawn};
use crate::infra::fs::TokioFileSystem;
use crate::runtime::TokioSpawner;

/// Budgeted access to a [`FileSystem`].
///
/// ```rust,ignore
/// use fsq::ops::FsQueue;
///
/// let queue = FsQueue::new();
/// queue.set_limit(256.0)?;
/// let files = queue.read_dir("/var/log").await?;
/// ```
pub struct FsQueue<F = TokioFileSystem, S = TokioSpawner> {
    dispatcher: Dispatcher<S>,
    fs: Arc<F>,
}

impl<F, S: Clone> Clone for FsQueue<F, S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            fs: Arc::clone(&self.fs),
        }
    }
}

impl FsQueue {
    /// Queue over the real filesystem with an unbounded budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_file_system(TokioFileSystem)
    }
}

impl Default for FsQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> FsQueue<F, TokioSpawner> {
    /// Queue over an injected provider with an unbounded budget.
    pub fn with_file_system(fs: F) -> Self {
        Self::from_parts(Dispatcher::default().named("fs"), fs)
    }
}

impl<F: FileSystem, S> FsQueue<F, S> {
    /// Bind an existing dispatcher to a provider.
    pub fn from_parts(dispatcher: Dispatcher<S>, fs: F) -> Self {
        Self {
            dispatcher,
            fs: Arc::new(fs),
        }
    }

    /// Dispatcher enforcing the budget.
    pub const fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    /// Provider the queue calls into.
    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// Calls currently in flight.
    pub fn outstanding(&self) -> usize {
        self.dispatcher.outstanding()
    }

    /// Current ceiling on calls in flight.
    pub fn limit(&self) -> f64 {
        self.dispatcher.limit()
    }

    /// Replace the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidLimit`] unless `limit` is finite and at least one.
    pub fn set_limit(&self, limit: f64) -> Result<(), DispatchError> {
        self.dispatcher.set_limit(limit)
    }
}

impl<F: FileSystem, S: Spawn> FsQueue<F, S> {
    /// Submit an operation addressed by name.
    pub fn submit(&self, op: Operation) -> PendingOperation<OperationOutput> {
        tracing::trace!(op = op.name(), "submitting named operation");
        self.run(move |fs| {
            let op = op.clone();
            async move { op.apply(fs.as_ref()).await }
        })
    }

    /// Read a whole file.
    pub fn read_file(&self, path: impl AsRef<Path>) -> PendingOperation<Vec<u8>> {
        let path = path.as_ref().to_path_buf();
        self.run(move |fs| {
            let path = path.clone();
            async move { fs.read_file(&path).await }
        })
    }

    /// Read a whole file as UTF-8.
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> PendingOperation<String> {
        let path = path.as_ref().to_path_buf();
        self.run(move |fs| {
            let path = path.clone();
            async move {
                let bytes = fs.read_file(&path).await?;
                String::from_utf8(bytes)
                    .map_err(|e| OperationError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
            }
        })
    }

    /// Create or replace a file.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<Vec<u8>>,
    ) -> PendingOperation<()> {
        self.write_file_with(path, data, WriteMode::Truncate)
    }

    /// Write a file with an explicit [`WriteMode`].
    pub fn write_file_with(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<Vec<u8>>,
        mode: WriteMode,
    ) -> PendingOperation<()> {
        let path = path.as_ref().to_path_buf();
        let data: Arc<[u8]> = Arc::from(data.into());
        self.run(move |fs| {
            let path = path.clone();
            let data = Arc::clone(&data);
            async move { fs.write_file(&path, &data, mode).await }
        })
    }

    /// Check whether a path exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> PendingOperation<bool> {
        let path = path.as_ref().to_path_buf();
        self.run(move |fs| {
            let path = path.clone();
            async move { fs.exists(&path).await }
        })
    }

    /// List a directory.
    pub fn read_dir(&self, path: impl AsRef<Path>) -> PendingOperation<Vec<String>> {
        let path = path.as_ref().to_path_buf();
        self.run(move |fs| {
            let path = path.clone();
            async move { fs.read_dir(&path).await }
        })
    }

    /// Fetch metadata.
    pub fn stat(&self, path: impl AsRef<Path>) -> PendingOperation<FileStat> {
        let path = path.as_ref().to_path_buf();
        self.run(move |fs| {
            let path = path.clone();
            async move { fs.stat(&path).await }
        })
    }

    fn run<T, G, Fut>(&self, call: G) -> PendingOperation<T>
    where
        G: Fn(Arc<F>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
        T: Send + 'static,
    {
        let fs = Arc::clone(&self.fs);
        self.dispatcher.submit(move || call(Arc::clone(&fs)))
    }
}
