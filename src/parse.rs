//! Decoding of the line-oriented edit stream.
//!
//! The producing tool emits one edit per line:
//!
//! ```text
//! kind:::path:::offset:::length:::replacement
//! ```
//!
//! The replacement is the remainder of the line, so it may itself contain
//! the separator; embedded NUL bytes stand for literal newlines and are
//! decoded here. A malformed line is never fatal: it is reported to stderr
//! and skipped, and parsing continues with the next line.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

use crate::edit::Edit;
use crate::resolve::PathResolver;

/// Field separator of the edit stream.
pub const FIELD_SEPARATOR: &str = ":::";

/// All edits of one run, grouped by canonical target path.
///
/// The per-file collection is deliberately unordered; sorting is a pure
/// function performed at application time.
pub type EditBatch = HashMap<PathBuf, Vec<Edit>>;

/// One decoded stream line, not yet resolved to an on-disk file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEdit {
    /// Target path exactly as the tool reported it
    pub path: String,
    pub edit: Edit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 5 `:::`-separated fields")]
    FieldCount,

    #[error("invalid offset: {0:?}")]
    Offset(String),

    #[error("invalid length: {0:?}")]
    Length(String),
}

/// Decodes a single stream line into a target path and an [`Edit`].
pub fn parse_edit_line(line: &str) -> Result<ParsedEdit, ParseError> {
    let line = line.trim_end_matches(['\n', '\r']);

    let mut fields = line.splitn(5, FIELD_SEPARATOR);
    let (Some(kind), Some(path), Some(offset), Some(length), Some(replacement)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(ParseError::FieldCount);
    };

    let offset: usize = offset
        .parse()
        .map_err(|_| ParseError::Offset(offset.to_string()))?;
    let length: usize = length
        .parse()
        .map_err(|_| ParseError::Length(length.to_string()))?;

    Ok(ParsedEdit {
        path: path.to_string(),
        edit: Edit::new(kind, offset, length, replacement.replace('\0', "\n")),
    })
}

/// Result of draining the whole stream.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub edits: EditBatch,
    /// Lines reported and skipped; informational, never exit-affecting
    pub malformed_lines: usize,
}

/// Drains the edit stream, grouping records by canonical target path.
///
/// Paths are resolved through `resolver` as they are first seen; records
/// whose path resolves to no existing file are dropped wholesale (the
/// resolver reports them once per raw path).
pub fn parse_edit_stream<R: BufRead>(
    input: R,
    resolver: &mut PathResolver,
) -> std::io::Result<ParseOutcome> {
    let mut outcome = ParseOutcome::default();

    for line in input.lines() {
        let line = line?;
        match parse_edit_line(&line) {
            Ok(parsed) => {
                let Some(path) = resolver.resolve(&parsed.path) else {
                    continue;
                };
                outcome.edits.entry(path).or_default().push(parsed.edit);
            }
            Err(_) => {
                eprintln!("{}", format!("Unable to parse edit: {line}").yellow());
                outcome.malformed_lines += 1;
            }
        }
    }

    Ok(outcome)
}
