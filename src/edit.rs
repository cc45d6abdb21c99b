use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use thiserror::Error;

/// The fundamental edit primitive: replace a byte range of one file with
/// new text.
///
/// Every record in the input stream compiles down to this one shape. An
/// insertion is a zero-`length` record, a deletion an empty `replacement`;
/// the applier treats all kinds uniformly as "replace
/// `[offset, offset + length)` with `replacement`".
///
/// The derived ordering is load-bearing: fields are declared in
/// `(offset, length, kind, replacement)` order so that sorting groups
/// identical and conflicting records adjacently and a reverse traversal
/// visits strictly descending offsets even when kinds are mixed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[must_use = "an Edit does nothing until it is applied to a buffer"]
pub struct Edit {
    /// Byte offset into the original file contents
    pub offset: usize,
    /// Byte count of the original range being replaced
    pub length: usize,
    /// Tag assigned by the producing tool; opaque to the applier
    pub kind: String,
    /// Replacement text, empty for a pure deletion
    pub replacement: String,
}

impl Edit {
    pub fn new(
        kind: impl Into<String>,
        offset: usize,
        length: usize,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            offset,
            length,
            kind: kind.into(),
            replacement: replacement.into(),
        }
    }

    /// End of the replaced range (exclusive).
    fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Same target range and kind as `other`, replacement not considered.
    fn same_range(&self, other: &Edit) -> bool {
        self.kind == other.kind && self.offset == other.offset && self.length == other.length
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Counts reported by one file's application pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use = "outcome counts feed the run totals and the exit status"]
pub struct FileOutcome {
    /// Non-duplicate, non-conflicting edits spliced into the buffer
    pub edits_applied: usize,
    /// Conflicting or out-of-range edits that were discarded
    pub errors: usize,
}

/// Applies a file's full edit collection to its byte buffer in one pass.
///
/// The records are sorted ascending and traversed in reverse. Reverse order
/// is a correctness requirement, not a convenience: splicing at a high
/// offset leaves the coordinates of every lower-offset record still pending
/// untouched, so no offsets are ever recomputed.
///
/// Adjacent-pair comparison against the previously visited record handles
/// the degenerate cases: a field-for-field duplicate is silently skipped,
/// and a record targeting the same range with a different replacement is a
/// conflict. The conflict is reported and counted, and the record already
/// applied (the one sorting higher) wins.
///
/// `path` is used for diagnostics only; the buffer is the unit of work.
pub fn apply_edits(contents: &mut Vec<u8>, edits: &mut [Edit], path: &Path) -> FileOutcome {
    edits.sort();

    let mut outcome = FileOutcome::default();
    let mut last_edit: Option<&Edit> = None;
    for edit in edits.iter().rev() {
        if last_edit == Some(edit) {
            continue;
        }
        if let Some(last) = last_edit {
            if edit.same_range(last) {
                eprintln!(
                    "{}",
                    format!(
                        "Conflicting edit: {} at offset {}, length {}: {:?} != {:?}",
                        path.display(),
                        edit.offset,
                        edit.length,
                        edit.replacement,
                        last.replacement
                    )
                    .red()
                );
                outcome.errors += 1;
                continue;
            }
        }

        last_edit = Some(edit);
        if edit.end() > contents.len() {
            eprintln!(
                "{}",
                format!(
                    "Edit out of range: {} at offset {}, length {} (file is {} bytes)",
                    path.display(),
                    edit.offset,
                    edit.length,
                    contents.len()
                )
                .red()
            );
            outcome.errors += 1;
            continue;
        }

        contents.splice(edit.offset..edit.end(), edit.replacement.bytes());
        if edit.replacement.is_empty() {
            extend_deletion_if_element_is_in_list(contents, edit.offset);
        }
        outcome.edits_applied += 1;
    }
    outcome
}

/// Reads `path`, applies its edits, and writes the result back atomically.
///
/// The buffer is fully prepared before any write is emitted; a file whose
/// contents come out unchanged is not rewritten at all.
pub fn apply_edits_to_file(path: &Path, edits: &mut [Edit]) -> Result<FileOutcome, EditError> {
    let original = fs::read(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut contents = original.clone();
    let outcome = apply_edits(&mut contents, edits, path);

    if contents != original {
        atomic_write(path, &contents)?;
    }
    Ok(outcome)
}

fn is_whitespace_byte(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r' | b' ')
}

/// Extends the range of a deletion if the deleted element was part of a list.
///
/// A tool that removes a list element usually cannot include the adjacent
/// separator in its own replacement range: another record may remove the
/// neighboring element, or all elements may end up removed. Instead the
/// tool deletes only the element's bytes and this helper cleans up the
/// separator left behind.
///
/// `contents` is the buffer with the deletion already applied and `offset`
/// points at the first byte after the deleted range. The scan skips
/// whitespace outward in both directions and inspects the first
/// non-whitespace byte on each side:
///
/// - separator (or introducer) before and `,` after: the forward
///   whitespace-plus-comma run is removed (the element sat between two
///   separators);
/// - `,` or `:` before and nothing relevant after: the backward run
///   including that separator is removed (the element was last in the
///   list);
/// - anything else, including a context of pure whitespace out to either
///   end of the buffer: no adjustment.
///
/// Only bytes are examined; nothing beyond the fixed `, : ( {` separator
/// set is understood.
fn extend_deletion_if_element_is_in_list(contents: &mut Vec<u8>, offset: usize) {
    let mut char_before = None;
    let mut left_trim_count = 0;
    for &byte in contents[..offset].iter().rev() {
        left_trim_count += 1;
        if is_whitespace_byte(byte) {
            continue;
        }
        if matches!(byte, b',' | b':' | b'(' | b'{') {
            char_before = Some(byte);
        }
        break;
    }

    let mut char_after = None;
    let mut right_trim_count = 0;
    for &byte in &contents[offset..] {
        right_trim_count += 1;
        if is_whitespace_byte(byte) {
            continue;
        }
        if byte == b',' {
            char_after = Some(byte);
        }
        break;
    }

    if let Some(before) = char_before {
        if char_after.is_some() {
            contents.drain(offset..offset + right_trim_count);
        } else if matches!(before, b',' | b':') {
            contents.drain(offset - left_trim_count..offset);
        }
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is untouched. The
/// mtime is bumped afterwards so incremental builds notice the change.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), EditError> {
    let write_error = |source: std::io::Error| EditError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Tempfile in the same directory so the rename stays on one filesystem
    let parent = path.parent().ok_or_else(|| {
        write_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(contents).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(write_error)?;

    Ok(())
}
