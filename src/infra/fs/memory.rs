//! In-memory filesystem with a simulated handle table.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::OperationError;
use crate::ops::{FileStat, FileSystem, WriteMode};
use crate::util::clock::now_ms;

struct MemFile {
    data: Vec<u8>,
    modified_ms: u128,
}

#[derive(Default)]
struct MemState {
    files: BTreeMap<PathBuf, MemFile>,
    dirs: BTreeSet<PathBuf>,
}

impl MemState {
    fn is_dir(&self, path: &Path) -> bool {
        is_root(path) || self.dirs.contains(path)
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if !is_root(ancestor) {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }
}

fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path == Path::new("/")
}

fn not_found(path: &Path) -> OperationError {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
    .into()
}

/// Filesystem kept entirely in memory.
///
/// Every call holds one simulated handle for its duration. With
/// [`InMemoryFileSystem::with_max_open_handles`] set, calls beyond that
/// many report [`OperationError::ResourceExhausted`], the way a process
/// runs into its descriptor limit.
#[derive(Default)]
pub struct InMemoryFileSystem {
    state: Mutex<MemState>,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    max_open: Option<usize>,
    latency: Option<Duration>,
}

struct HandleGuard<'a> {
    open: &'a AtomicUsize,
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::AcqRel);
    }
}

impl InMemoryFileSystem {
    /// Empty filesystem with no handle limit and no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse calls once `max` handles are open.
    #[must_use]
    pub fn with_max_open_handles(mut self, max: usize) -> Self {
        self.max_open = Some(max);
        self
    }

    /// Hold each handle for `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Create a directory and its parents.
    pub fn create_dir_all(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        state.add_parents(path);
        if !is_root(path) {
            state.dirs.insert(path.to_path_buf());
        }
    }

    /// Seed a file, creating its parents.
    pub fn insert_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        state.add_parents(path);
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                data: data.into(),
                modified_ms: now_ms(),
            },
        );
    }

    /// Handles open right now.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }

    /// Most handles ever open at once.
    pub fn peak_open_handles(&self) -> usize {
        self.peak_open.load(Ordering::Acquire)
    }

    fn open_handle(&self) -> Result<HandleGuard<'_>, OperationError> {
        let mut current = self.open.load(Ordering::Acquire);
        loop {
            if self.max_open.is_some_and(|max| current >= max) {
                tracing::debug!(open = current, "simulated handle table full");
                return Err(OperationError::ResourceExhausted);
            }
            match self.open.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak_open.fetch_max(current + 1, Ordering::AcqRel);
                    return Ok(HandleGuard { open: &self.open });
                }
                Err(actual) => current = actual,
            }
        }
    }

    async fn hold(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OperationError> {
        let _handle = self.open_handle()?;
        self.hold().await;
        let state = self.state.lock();
        if let Some(file) = state.files.get(path) {
            return Ok(file.data.clone());
        }
        if state.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )
            .into());
        }
        Err(not_found(path))
    }

    async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<(), OperationError> {
        let _handle = self.open_handle()?;
        self.hold().await;
        let mut state = self.state.lock();
        if state.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )
            .into());
        }
        let modified_ms = now_ms();
        if let Some(file) = state.files.get_mut(path) {
            match mode {
                WriteMode::CreateNew => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("file exists: {}", path.display()),
                    )
                    .into());
                }
                WriteMode::Append => file.data.extend_from_slice(data),
                WriteMode::Truncate => file.data = data.to_vec(),
            }
            file.modified_ms = modified_ms;
            return Ok(());
        }
        state.add_parents(path);
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                data: data.to_vec(),
                modified_ms,
            },
        );
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, OperationError> {
        let _handle = self.open_handle()?;
        self.hold().await;
        let state = self.state.lock();
        Ok(state.files.contains_key(path) || state.is_dir(path))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, OperationError> {
        let _handle = self.open_handle()?;
        self.hold().await;
        let state = self.state.lock();
        if !state.is_dir(path) {
            return Err(not_found(path));
        }
        let names: BTreeSet<String> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|entry| entry.parent() == Some(path))
            .filter_map(|entry| entry.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn stat(&self, path: &Path) -> Result<FileStat, OperationError> {
        let _handle = self.open_handle()?;
        self.hold().await;
        let state = self.state.lock();
        if let Some(file) = state.files.get(path) {
            return Ok(FileStat {
                len: file.data.len() as u64,
                is_file: true,
                is_dir: false,
                readonly: false,
                modified_ms: Some(file.modified_ms),
            });
        }
        if state.is_dir(path) {
            return Ok(FileStat {
                len: 0,
                is_file: false,
                is_dir: true,
                readonly: false,
                modified_ms: None,
            });
        }
        Err(not_found(path))
    }
}
