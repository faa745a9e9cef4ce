//! Filesystem capability used by the scanner and the writer
//!
//! The core only needs to list entries under a root, read a source and write
//! a fragment. [`dir`] backs these with a real directory; tests use an
//! in-memory map.

use std::path::PathBuf;
use thiserror::Error;

pub mod dir;
#[cfg(test)]
pub(crate) mod memory;

pub use dir::{DirSink, DirTree};
#[cfg(test)]
pub(crate) use memory::MemoryTree;

/// One entry found while walking a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path relative to the tree root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
}

impl SourceEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }

    /// True when the entry lives below a subdirectory of the root.
    pub fn is_nested(&self) -> bool {
        self.path.contains('/')
    }
}

/// Read side: a tree of authored migration sources.
pub trait SourceTree {
    /// Recursively enumerate entries, directories included. A failure on one
    /// entry is yielded in place as [`FsError::Traversal`] and does not end
    /// the walk. [`FsError::Io`] means the root itself could not be listed.
    fn walk(&self) -> Box<dyn Iterator<Item = Result<SourceEntry, FsError>> + '_>;

    /// Read the full contents of the entry at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;
}

/// Write side: the directory receiving generated fragments.
pub trait FragmentSink {
    /// Write `contents` to the file `name`, replacing any existing file.
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), FsError>;
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to traverse {path}: {message}")]
    Traversal { path: PathBuf, message: String },
}

impl FsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }
}
