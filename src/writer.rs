//! Fragment writing and cross-dialect balancing
//!
//! Every dialect+direction pair of a group must end up with the same number
//! of fragments, so a runner applying fragments by ascending sequence number
//! stays in lock-step across dialects. Shorter sources are padded with blank
//! fragments up to the longest one in the group.

use crate::fragment::{SplitError, blank_fragment, generate_fragments};
use crate::input::{FragmentSink, FsError, SourceTree};
use crate::migration::{Dialect, Direction, Migration};
use crate::scanner::MigrationGroup;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Sequence numbers are rendered with six digits.
pub const MAX_FRAGMENTS: usize = 1_000_000;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to process {path}: {source}")]
    Split {
        path: String,
        #[source]
        source: SplitError,
    },

    #[error("{path} splits into {count} fragments; at most {max} are supported", max = MAX_FRAGMENTS - 1)]
    TooManyFragments { path: String, count: usize },
}

/// Names of the files written for one group, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutput {
    pub fragments: Vec<String>,
    pub blanks: Vec<String>,
}

impl GroupOutput {
    pub fn total(&self) -> usize {
        self.fragments.len() + self.blanks.len()
    }
}

/// Output filename of fragment `index` of `migration`.
///
/// `{id}{index:06}_{name}[.{dialect}].{direction}.sql`
pub fn fragment_name(group: &MigrationGroup, migration: &Migration, index: usize) -> String {
    match migration.dialect.segment() {
        Some(dialect) => format!(
            "{}{:06}_{}.{}.{}.sql",
            group.id, index, group.name, dialect, migration.direction
        ),
        None => format!(
            "{}{:06}_{}.{}.sql",
            group.id, index, group.name, migration.direction
        ),
    }
}

/// Split every source of `group`, write the fragments to `sink` and pad
/// shorter dialect+direction pairs with blank fragments.
///
/// Real fragments are all written before any padding. The group is only
/// read; nothing is rolled back if a write fails midway.
pub fn generate_group(
    group: &MigrationGroup,
    tree: &dyn SourceTree,
    sink: &mut dyn FragmentSink,
    command_line: &str,
) -> Result<GroupOutput, WriteError> {
    let migrations = group.migrations();
    let mut counts: HashMap<(&Dialect, Direction), usize> = HashMap::new();
    let mut max_count = 0;
    let mut output = GroupOutput::default();

    for migration in &migrations {
        let source = tree.read(&migration.path)?;
        let fragments =
            generate_fragments(&source, command_line).map_err(|source| WriteError::Split {
                path: migration.path.clone(),
                source,
            })?;
        if fragments.len() >= MAX_FRAGMENTS {
            return Err(WriteError::TooManyFragments {
                path: migration.path.clone(),
                count: fragments.len(),
            });
        }

        counts.insert((&migration.dialect, migration.direction), fragments.len());
        max_count = max_count.max(fragments.len());

        for (index, fragment) in fragments.iter().enumerate() {
            let name = fragment_name(group, migration, index);
            sink.write(&name, fragment)?;
            debug!(source = %migration.path, fragment = %name, "wrote fragment");
            output.fragments.push(name);
        }
    }

    let blank = blank_fragment(command_line);
    for migration in &migrations {
        let count = counts
            .get(&(&migration.dialect, migration.direction))
            .copied()
            .unwrap_or(0);
        for index in count..max_count {
            let name = fragment_name(group, migration, index);
            sink.write(&name, &blank)?;
            debug!(source = %migration.path, fragment = %name, "wrote blank fragment");
            output.blanks.push(name);
        }
    }

    info!(
        id = %group.id,
        name = %group.name,
        fragments = output.fragments.len(),
        blanks = output.blanks.len(),
        "generated migration group"
    );
    Ok(output)
}
