//! migrate-gen: per-dialect SQL migration fragment generator
//!
//! Authored migration sources are grouped by their logical id, split at
//! `--split` markers into independently applied fragments, and written out
//! so that every dialect of a migration has the same number of ordered
//! fragments. Shorter dialects are padded with blank fragments.

pub mod config;
pub mod fragment;
pub mod input;
pub mod migration;
pub mod pipeline;
pub mod scanner;
pub mod validate;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use input::{DirSink, DirTree, FragmentSink, SourceTree};
pub use migration::{Dialect, Direction, Migration, ParseError, parse_migration};
pub use pipeline::{ErrorKind, GenerateError, GenerationSummary, Generator};
pub use scanner::{MigrationGroup, MigrationGroups, read_migrations, scan_migrations};
pub use validate::{ValidationError, validate_dialects};
pub use writer::{GroupOutput, WriteError, generate_group};
