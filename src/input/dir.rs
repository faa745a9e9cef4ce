//! Directory-backed source tree and fragment sink

use crate::input::{FragmentSink, FsError, SourceEntry, SourceTree};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A source tree rooted at a directory on disk.
///
/// Entries are walked recursively in file-name order so that scanning is
/// deterministic across platforms.
#[derive(Debug, Clone)]
pub struct DirTree {
    root: PathBuf,
}

impl DirTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Like [`DirTree::new`], but fails unless `root` is an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        let metadata = std::fs::metadata(&root).map_err(|e| FsError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(FsError::io(
                &root,
                io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        Ok(Self { root })
    }

    /// Render `path` relative to the root with `/` separators.
    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl SourceTree for DirTree {
    fn walk(&self) -> Box<dyn Iterator<Item = Result<SourceEntry, FsError>> + '_> {
        let iter = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| match entry {
                Ok(entry) => Ok(SourceEntry {
                    path: self.relative(entry.path()),
                    is_dir: entry.file_type().is_dir(),
                }),
                // Depth 0 is the root: nothing below it can be listed.
                Err(err) if err.depth() == 0 => Err(FsError::io(&self.root, err.into())),
                Err(err) => Err(FsError::Traversal {
                    path: err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone()),
                    message: err.to_string(),
                }),
            });
        Box::new(iter)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|e| FsError::io(full, e))
    }
}

/// Writes fragments into a target directory.
#[derive(Debug, Clone)]
pub struct DirSink {
    target: PathBuf,
}

impl DirSink {
    /// Open `target` for writing, creating it (and its parents) if missing.
    pub fn create(target: impl Into<PathBuf>) -> Result<Self, FsError> {
        let target = target.into();
        std::fs::create_dir_all(&target).map_err(|e| FsError::io(&target, e))?;
        Ok(Self { target })
    }
}

impl FragmentSink for DirSink {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), FsError> {
        let dst = self.target.join(name);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&dst).map_err(|e| FsError::io(&dst, e))?;
        file.write_all(contents).map_err(|e| FsError::io(&dst, e))
    }
}
