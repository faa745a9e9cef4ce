//! Migration source filename classification
//!
//! Authored sources follow the grammar
//! `{id:14}000000_{name}[.{dialect}].{up|down}.sql`. Every file sharing an id
//! belongs to one logical migration; the dialect and direction segments
//! partition its physical files.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Grammar every authored migration source must match exactly.
pub const MIGRATION_PATTERN: &str = r"^(\d{14})000000_([^.]+)(\.[a-z0-9]+)?\.(up|down)\.sql$";

static MIGRATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MIGRATION_PATTERN).expect("migration pattern is a valid regex"));

/// Key used for generic migrations in logs and messages.
pub const GENERIC_DIALECT_KEY: &str = "any";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to parse migration filename {filename}; expected pattern {pattern}")]
pub struct ParseError {
    pub filename: String,
    pub pattern: &'static str,
}

/// Target backend of a migration source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dialect {
    /// Applies to every dialect lacking its own file.
    Generic,
    /// A specific backend such as `postgres`.
    Named(String),
}

impl Dialect {
    pub fn is_generic(&self) -> bool {
        matches!(self, Dialect::Generic)
    }

    /// The dialect segment as it appears in filenames, `None` for generic.
    pub fn segment(&self) -> Option<&str> {
        match self {
            Dialect::Generic => None,
            Dialect::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment().unwrap_or(GENERIC_DIALECT_KEY))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// One physical migration source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Path relative to the source tree root.
    pub path: String,

    /// 14-digit timestamp identifying the logical migration.
    pub id: String,

    pub name: String,
    pub dialect: Dialect,
    pub direction: Direction,
}

/// Classify a filename against [`MIGRATION_PATTERN`].
pub fn parse_migration(filename: &str) -> Result<Migration, ParseError> {
    let err = || ParseError {
        filename: filename.to_string(),
        pattern: MIGRATION_PATTERN,
    };

    let caps = MIGRATION_RE.captures(filename).ok_or_else(err)?;
    if caps.len() != 5 {
        return Err(err());
    }

    let (Some(id), Some(name), Some(direction)) = (caps.get(1), caps.get(2), caps.get(4)) else {
        return Err(err());
    };
    let direction = direction.as_str().parse::<Direction>().map_err(|_| err())?;

    // Group 3 keeps its leading dot.
    let dialect = match caps.get(3) {
        Some(segment) => Dialect::Named(segment.as_str()[1..].to_string()),
        None => Dialect::Generic,
    };

    Ok(Migration {
        path: filename.to_string(),
        id: id.as_str().to_string(),
        name: name.as_str().to_string(),
        dialect,
        direction,
    })
}
