//! Dialect coverage checks
//!
//! Catches a dialect-specific source that was forgotten for one backend
//! before generation writes an unbalanced set.

use crate::migration::{Dialect, Direction};
use crate::scanner::{MigrationGroup, MigrationGroups};
use std::collections::HashSet;
use strum::IntoEnumIterator;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unexpected dialect {dialect} in filename {path}")]
    UnexpectedDialect { dialect: String, path: String },

    #[error(
        "dialect {dialect} not found for {direction} migration {id}; use --dialects=\"\" to disable dialect validation"
    )]
    MissingDialect {
        dialect: String,
        id: String,
        direction: Direction,
    },
}

/// Check every group against the expected dialects.
///
/// Each child must use an expected dialect, and each expected dialect must
/// have an up and a down source, either its own or the generic fallback.
/// An empty `expected_dialects` disables the check.
pub fn validate_dialects(
    groups: &MigrationGroups,
    expected_dialects: &[String],
) -> Result<(), ValidationError> {
    if expected_dialects.is_empty() {
        return Ok(());
    }

    let expected: HashSet<&str> = expected_dialects.iter().map(String::as_str).collect();
    for group in groups.values() {
        validate_group(group, &expected, expected_dialects)?;
    }
    Ok(())
}

fn validate_group(
    group: &MigrationGroup,
    expected: &HashSet<&str>,
    expected_dialects: &[String],
) -> Result<(), ValidationError> {
    let mut covered: HashSet<(&str, Direction)> = HashSet::new();

    for child in &group.children {
        let Dialect::Named(dialect) = &child.dialect else {
            continue;
        };
        if !expected.contains(dialect.as_str()) {
            return Err(ValidationError::UnexpectedDialect {
                dialect: dialect.clone(),
                path: child.path.clone(),
            });
        }
        covered.insert((dialect.as_str(), child.direction));
    }

    for dialect in expected_dialects {
        for direction in Direction::iter() {
            if !covered.contains(&(dialect.as_str(), direction))
                && group.fallback(direction).is_none()
            {
                return Err(ValidationError::MissingDialect {
                    dialect: dialect.clone(),
                    id: group.id.clone(),
                    direction,
                });
            }
        }
    }
    Ok(())
}
