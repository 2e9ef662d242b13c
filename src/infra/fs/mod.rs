//! Filesystem providers.

pub mod memory;
pub mod os;

pub use memory::InMemoryFileSystem;
pub use os::TokioFileSystem;
