//! In-memory source tree and fragment sink

use crate::input::{FragmentSink, FsError, SourceEntry, SourceTree};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// Flat map of `/`-separated paths to file contents.
///
/// Directories are implied by the paths of the files inside them. Paths
/// registered with [`MemoryTree::with_broken_entry`] surface as traversal
/// errors during [`SourceTree::walk`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeMap<String, Vec<u8>>,
    broken: BTreeSet<String>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn with_broken_entry(mut self, path: &str) -> Self {
        self.broken.insert(path.to_string());
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl AsRef<[u8]>) {
        self.files
            .insert(path.to_string(), contents.as_ref().to_vec());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// File names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

impl SourceTree for MemoryTree {
    fn walk(&self) -> Box<dyn Iterator<Item = Result<SourceEntry, FsError>> + '_> {
        let mut entries: BTreeMap<&str, Result<SourceEntry, FsError>> = BTreeMap::new();

        for path in self.files.keys() {
            for (idx, _) in path.match_indices('/') {
                let parent = &path[..idx];
                entries
                    .entry(parent)
                    .or_insert_with(|| Ok(SourceEntry::dir(parent)));
            }
            entries.insert(path.as_str(), Ok(SourceEntry::file(path.as_str())));
        }

        for path in &self.broken {
            entries.insert(
                path.as_str(),
                Err(FsError::Traversal {
                    path: path.into(),
                    message: "entry is unreadable".to_string(),
                }),
            );
        }

        Box::new(entries.into_values())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.files.get(path).cloned().ok_or_else(|| {
            FsError::io(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such file in memory tree"),
            )
        })
    }
}

impl FragmentSink for MemoryTree {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), FsError> {
        self.insert(name, contents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_yields_implied_directories() {
        let tree = MemoryTree::new()
            .with_file("a.sql", "a")
            .with_file("sub/deeper/b.sql", "b");

        let entries: Vec<SourceEntry> = tree.walk().map(|e| e.expect("entry")).collect();
        assert_eq!(
            entries,
            vec![
                SourceEntry::file("a.sql"),
                SourceEntry::dir("sub"),
                SourceEntry::dir("sub/deeper"),
                SourceEntry::file("sub/deeper/b.sql"),
            ]
        );
    }

    #[test]
    fn test_broken_entry_is_yielded_as_error() {
        let tree = MemoryTree::new()
            .with_file("a.sql", "a")
            .with_broken_entry("b.sql");

        let results: Vec<_> = tree.walk().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FsError::Traversal { .. })));
    }

    #[test]
    fn test_read_missing_is_io_error() {
        let tree = MemoryTree::new();
        assert!(matches!(tree.read("nope.sql"), Err(FsError::Io { .. })));
    }
}
