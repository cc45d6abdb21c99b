//! Per-file orchestration and run accumulation.
//!
//! Files are independent of each other and may be processed in any order;
//! the totals are an explicit accumulator merged per file rather than
//! shared state, which also keeps the per-file work side-effect-free from
//! the rest of the run's point of view.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use crate::edit::{apply_edits, atomic_write, Edit, EditError, FileOutcome};
use crate::parse::EditBatch;

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// Apply in memory and report, but write nothing back
    pub dry_run: bool,
    /// Print a unified diff for each modified file
    pub show_diff: bool,
}

/// Accumulated counts of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use = "the error total decides the process exit status"]
pub struct Totals {
    pub edits_applied: usize,
    /// Conflicting or out-of-range edits that were discarded
    pub errors: usize,
    pub files_done: usize,
    /// Files dropped whole because they could not be read or written
    pub io_failures: usize,
}

impl Totals {
    fn absorb(&mut self, outcome: FileOutcome) {
        self.edits_applied += outcome.edits_applied;
        self.errors += outcome.errors;
    }
}

/// Applies every file's batch, reporting progress after each file.
///
/// A file that cannot be read or written is reported and skipped without
/// affecting any other file; its target is left either untouched or fully
/// updated, never in between.
pub fn apply_all(mut batch: EditBatch, options: &DriverOptions) -> Totals {
    let total_files = batch.len();
    let mut totals = Totals::default();

    for (path, edits) in batch.iter_mut() {
        match apply_one(path, edits, options) {
            Ok(outcome) => totals.absorb(outcome),
            Err(error) => {
                eprintln!("{}", error.to_string().red());
                totals.io_failures += 1;
            }
        }
        totals.files_done += 1;

        let percentage = (totals.files_done as f64 / total_files as f64) * 100.0;
        print!(
            "Applied {} edits ({} errors) to {} files [{:.2}%]\r",
            totals.edits_applied, totals.errors, totals.files_done, percentage
        );
        let _ = io::stdout().flush();
    }

    println!();
    totals
}

/// Read-modify-write for a single file.
fn apply_one(
    path: &Path,
    edits: &mut [Edit],
    options: &DriverOptions,
) -> Result<FileOutcome, EditError> {
    let original = fs::read(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut contents = original.clone();
    let outcome = apply_edits(&mut contents, edits, path);

    if contents != original {
        if options.show_diff {
            display_diff(path, &original, &contents);
        }
        if !options.dry_run {
            atomic_write(path, &contents)?;
        }
    }
    Ok(outcome)
}

/// Unified diff between the original and edited contents.
fn display_diff(path: &Path, original: &[u8], modified: &[u8]) {
    println!(
        "\n{}",
        format!("--- {} (original)", path.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", path.display()).dimmed());

    let original = String::from_utf8_lossy(original);
    let modified = String::from_utf8_lossy(modified);
    let diff = TextDiff::from_lines(original.as_ref(), modified.as_ref());

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
