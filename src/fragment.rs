//! Splitting migration sources into fragments
//!
//! A source is cut at every `--split` marker. Each chunk becomes one
//! fragment, prefixed with a header recording the command line that
//! generated it. Fragment bodies are opaque bytes.

use thiserror::Error;

/// Marker delimiting independently applied statements in one source.
pub const SPLIT_MARKER: &[u8] = b"--split";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("no migration chunks found")]
    NoFragments,
}

/// Header prepended to every real fragment.
pub fn fragment_header(command_line: &str) -> Vec<u8> {
    format!(
        "-- Migration generated by the command below; DO NOT EDIT.\n-- {}\n",
        command_line
    )
    .into_bytes()
}

/// Full contents of a padding fragment.
pub fn blank_fragment(command_line: &str) -> Vec<u8> {
    format!(
        "-- This is a blank migration. It is generated to ensure that all dialects are represented in the migration files.\n-- {}\n",
        command_line
    )
    .into_bytes()
}

/// Cut `source` at every occurrence of [`SPLIT_MARKER`].
///
/// `k` markers yield `k + 1` chunks, some possibly empty. The markers
/// themselves are dropped.
pub fn split_source(source: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = source;
    while let Some(pos) = find(rest, SPLIT_MARKER) {
        chunks.push(&rest[..pos]);
        rest = &rest[pos + SPLIT_MARKER.len()..];
    }
    chunks.push(rest);
    chunks
}

/// Split `source` and prefix each chunk with the generated header.
pub fn generate_fragments(source: &[u8], command_line: &str) -> Result<Vec<Vec<u8>>, SplitError> {
    let header = fragment_header(command_line);
    let fragments: Vec<Vec<u8>> = split_source(source)
        .into_iter()
        .map(|chunk| [header.as_slice(), chunk].concat())
        .collect();

    if fragments.is_empty() {
        return Err(SplitError::NoFragments);
    }
    Ok(fragments)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
