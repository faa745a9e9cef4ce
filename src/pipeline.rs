//! Generation pipeline: scan → validate → write every group.
//!
//! [`Generator`] holds the source tree and run settings; [`Generator::run`]
//! drives the scanner and the writer and reports what was written. Groups
//! are processed in ascending id order. A failure stops the run and leaves
//! fragments of earlier groups on disk.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::input::{FragmentSink, SourceTree};
use crate::scanner::{ScanError, read_migrations};
use crate::writer::{GroupOutput, WriteError, generate_group};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to generate migration {id}")]
    Write {
        id: String,
        #[source]
        source: WriteError,
    },
}

/// Coarse classification of a fatal generation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source filename breaks the naming grammar, or files of one id
    /// disagree on the name.
    Grammar,
    DialectCoverage,
    Io,
    /// A source could not be split into a usable fragment sequence.
    Split,
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::Scan(ScanError::Parse(_) | ScanError::NameMismatch { .. }) => {
                ErrorKind::Grammar
            }
            GenerateError::Scan(ScanError::Validation(_)) => ErrorKind::DialectCoverage,
            GenerateError::Scan(ScanError::Fs(_)) => ErrorKind::Io,
            GenerateError::Write { source, .. } => match source {
                WriteError::Fs(_) => ErrorKind::Io,
                WriteError::Split { .. } | WriteError::TooManyFragments { .. } => {
                    ErrorKind::Split
                }
            },
        }
    }
}

/// Files written by one run, keyed by group id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub groups: BTreeMap<String, GroupOutput>,
}

impl GenerationSummary {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// All files written, real and blank.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(GroupOutput::total).sum()
    }

    pub fn blank_count(&self) -> usize {
        self.groups.values().map(|g| g.blanks.len()).sum()
    }
}

pub struct Generator<'a> {
    tree: &'a dyn SourceTree,
    expected_dialects: Vec<String>,
    command_line: String,
}

impl<'a> Generator<'a> {
    /// `command_line` is recorded in the header of every generated file.
    pub fn new(tree: &'a dyn SourceTree, command_line: impl Into<String>) -> Self {
        Self {
            tree,
            expected_dialects: Vec::new(),
            command_line: command_line.into(),
        }
    }

    /// Require up/down coverage for each of `dialects`. Empty disables the
    /// check.
    pub fn with_dialects(mut self, dialects: Vec<String>) -> Self {
        self.expected_dialects = dialects;
        self
    }

    pub fn run(&self, sink: &mut dyn FragmentSink) -> Result<GenerationSummary, GenerateError> {
        let groups = read_migrations(self.tree, &self.expected_dialects)?;

        let mut summary = GenerationSummary::default();
        for (id, group) in &groups {
            let output = generate_group(group, self.tree, sink, &self.command_line).map_err(
                |source| GenerateError::Write {
                    id: id.clone(),
                    source,
                },
            )?;
            summary.groups.insert(id.clone(), output);
        }
        Ok(summary)
    }
}
