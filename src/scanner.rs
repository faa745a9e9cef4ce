//! Source tree scanning and grouping by logical migration id

use crate::input::{FsError, SourceTree};
use crate::migration::{Direction, Migration, ParseError, parse_migration};
use crate::validate::{ValidationError, validate_dialects};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "migration {id} is named '{expected}' but {path} names it '{found}'; all files of one migration must share its name"
    )]
    NameMismatch {
        id: String,
        expected: String,
        found: String,
        path: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to scan migration sources")]
    Fs(#[source] FsError),
}

/// All physical source files sharing one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationGroup {
    pub id: String,
    pub name: String,

    /// Dialect-specific sources, in scan order.
    pub children: Vec<Migration>,

    pub fallback_up: Option<Migration>,
    pub fallback_down: Option<Migration>,
}

/// Groups keyed by id, iterated in ascending id order.
pub type MigrationGroups = BTreeMap<String, MigrationGroup>;

impl MigrationGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
            fallback_up: None,
            fallback_down: None,
        }
    }

    pub fn fallback(&self, direction: Direction) -> Option<&Migration> {
        match direction {
            Direction::Up => self.fallback_up.as_ref(),
            Direction::Down => self.fallback_down.as_ref(),
        }
    }

    /// Every source of the group: children first, then the generic down and
    /// generic up fallbacks when present.
    ///
    /// Returns a fresh list on each call; the group itself is left untouched.
    pub fn migrations(&self) -> Vec<&Migration> {
        self.children
            .iter()
            .chain(self.fallback_down.as_ref())
            .chain(self.fallback_up.as_ref())
            .collect()
    }

    fn insert(&mut self, migration: Migration) -> Result<(), ScanError> {
        if migration.name != self.name {
            return Err(ScanError::NameMismatch {
                id: self.id.clone(),
                expected: self.name.clone(),
                found: migration.name,
                path: migration.path,
            });
        }

        if migration.dialect.is_generic() {
            // Names agree, so a second generic file for the same direction
            // would need the same filename.
            match migration.direction {
                Direction::Up => self.fallback_up = Some(migration),
                Direction::Down => self.fallback_down = Some(migration),
            }
        } else {
            self.children.push(migration);
        }
        Ok(())
    }
}

/// Walk `tree` and group every root-level source by id.
///
/// Directories are skipped. Nested files and per-entry traversal failures
/// are logged and skipped. An unreadable root or a file that does not match
/// the filename grammar aborts the scan.
pub fn scan_migrations(tree: &dyn SourceTree) -> Result<MigrationGroups, ScanError> {
    let mut groups = MigrationGroups::new();

    for entry in tree.walk() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err @ FsError::Traversal { .. }) => {
                warn!("unexpected error while scanning sources: {}", err);
                continue;
            }
            Err(err) => return Err(ScanError::Fs(err)),
        };
        if entry.is_dir {
            continue;
        }
        if entry.is_nested() {
            warn!("ignoring nested file {}", entry.path);
            continue;
        }

        let migration = parse_migration(&entry.path)?;
        debug!(
            path = %migration.path,
            dialect = %migration.dialect,
            direction = %migration.direction,
            "classified migration source"
        );

        groups
            .entry(migration.id.clone())
            .or_insert_with(|| MigrationGroup::new(&migration.id, &migration.name))
            .insert(migration)?;
    }

    Ok(groups)
}

/// Scan `tree`, then check dialect coverage against `expected_dialects`.
///
/// An empty `expected_dialects` skips the coverage check.
pub fn read_migrations(
    tree: &dyn SourceTree,
    expected_dialects: &[String],
) -> Result<MigrationGroups, ScanError> {
    let groups = scan_migrations(tree)?;
    validate_dialects(&groups, expected_dialects)?;
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MemoryTree, SourceEntry};
    use crate::migration::Dialect;
    use std::io;

    /// A tree whose root cannot be listed.
    struct UnreadableRoot;

    impl SourceTree for UnreadableRoot {
        fn walk(&self) -> Box<dyn Iterator<Item = Result<SourceEntry, FsError>> + '_> {
            Box::new(std::iter::once(Err(FsError::io(
                "migrations",
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ))))
        }

        fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
            Err(FsError::io(path, io::Error::from(io::ErrorKind::NotFound)))
        }
    }

    #[test]
    fn test_groups_by_id_and_splits_fallbacks() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_init.up.sql", "")
            .with_file("20230101000000000000_init.down.sql", "")
            .with_file("20230101000000000000_init.postgres.up.sql", "")
            .with_file("20230202000000000000_users.mysql.down.sql", "");

        let groups = scan_migrations(&tree).expect("scan");
        assert_eq!(
            groups.keys().collect::<Vec<_>>(),
            vec!["20230101000000", "20230202000000"]
        );

        let init = &groups["20230101000000"];
        assert_eq!(init.name, "init");
        assert_eq!(init.children.len(), 1);
        assert_eq!(
            init.children[0].dialect,
            Dialect::Named("postgres".to_string())
        );
        assert_eq!(
            init.fallback_up.as_ref().map(|m| m.path.as_str()),
            Some("20230101000000000000_init.up.sql")
        );
        assert_eq!(
            init.fallback_down.as_ref().map(|m| m.path.as_str()),
            Some("20230101000000000000_init.down.sql")
        );

        let users = &groups["20230202000000"];
        assert!(users.fallback_up.is_none());
        assert!(users.fallback_down.is_none());
        assert_eq!(users.children.len(), 1);
    }

    #[test]
    fn test_nested_files_and_directories_are_skipped() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_init.up.sql", "")
            .with_file("archive/not-a-migration.txt", "")
            .with_file("archive/20230101000000000000_old.up.sql", "");

        let groups = scan_migrations(&tree).expect("nested files must not fail the scan");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["20230101000000"].name, "init");
    }

    #[test]
    fn test_traversal_errors_are_skipped() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_init.up.sql", "")
            .with_broken_entry("20230101000000000000_init.down.sql");

        let groups = scan_migrations(&tree).expect("traversal errors must not fail the scan");
        let group = &groups["20230101000000"];
        assert!(group.fallback_up.is_some());
        assert!(group.fallback_down.is_none());
    }

    #[test]
    fn test_unreadable_root_aborts_scan() {
        match scan_migrations(&UnreadableRoot) {
            Err(ScanError::Fs(FsError::Io { path, source })) => {
                assert_eq!(path, std::path::PathBuf::from("migrations"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("Expected ScanError::Fs, got: {:?}", other),
        }
    }

    #[test]
    fn test_grammar_violation_aborts_scan() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_init.up.sql", "")
            .with_file("notes.md", "");

        match scan_migrations(&tree) {
            Err(ScanError::Parse(err)) => assert_eq!(err.filename, "notes.md"),
            other => panic!("Expected ScanError::Parse, got: {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_names_for_one_id_fail_loudly() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_create.up.sql", "")
            .with_file("20230101000000000000_init.up.sql", "");

        let err = scan_migrations(&tree).unwrap_err();
        match &err {
            ScanError::NameMismatch {
                id,
                expected,
                found,
                path,
            } => {
                assert_eq!(id, "20230101000000");
                assert_eq!(expected, "create");
                assert_eq!(found, "init");
                assert_eq!(path, "20230101000000000000_init.up.sql");
            }
            other => panic!("Expected ScanError::NameMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_migrations_order_and_group_is_untouched() {
        let tree = MemoryTree::new()
            .with_file("20230101000000000000_init.up.sql", "")
            .with_file("20230101000000000000_init.down.sql", "")
            .with_file("20230101000000000000_init.mysql.up.sql", "")
            .with_file("20230101000000000000_init.postgres.down.sql", "");

        let groups = scan_migrations(&tree).expect("scan");
        let group = &groups["20230101000000"];
        let before = group.clone();

        for _ in 0..2 {
            let paths: Vec<&str> = group.migrations().iter().map(|m| m.path.as_str()).collect();
            assert_eq!(
                paths,
                vec![
                    "20230101000000000000_init.mysql.up.sql",
                    "20230101000000000000_init.postgres.down.sql",
                    "20230101000000000000_init.down.sql",
                    "20230101000000000000_init.up.sql",
                ]
            );
        }
        assert_eq!(group, &before);
    }

    #[test]
    fn test_read_migrations_runs_validation_when_dialects_given() {
        let tree = MemoryTree::new().with_file("20230101000000000000_init.postgres.up.sql", "");

        assert!(read_migrations(&tree, &[]).is_ok());

        let err = read_migrations(&tree, &["postgres".to_string()]).unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }
}
