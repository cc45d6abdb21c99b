//! Version-control eligibility: which files may be edited at all.
//!
//! The engine only ever consumes this as a membership predicate; the
//! enumeration itself is delegated to git.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// The set of canonical paths of version-control-tracked files.
#[derive(Debug, Clone, Default)]
pub struct TrackedFiles {
    paths: HashSet<PathBuf>,
}

impl TrackedFiles {
    /// Enumerates tracked files via `git ls-files`, run in the current
    /// directory. `filters` are passed through as pathspecs, so prefix
    /// filtering happens inside git; without filters every tracked file is
    /// eligible.
    ///
    /// Listed paths that no longer exist on disk are skipped. A failing
    /// git invocation is a startup error: without the tracked set there is
    /// no meaningful eligibility decision to make.
    pub fn from_git(filters: &[PathBuf]) -> Result<Self> {
        let mut command = Command::new("git");
        command.arg("ls-files");
        for filter in filters {
            command.arg(filter);
        }

        let output = command.output().context("failed to run `git ls-files`")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("`git ls-files` failed: {}", stderr.trim());
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let paths = listing
            .lines()
            .filter_map(|line| fs::canonicalize(line).ok())
            .collect();
        Ok(Self { paths })
    }

    /// Builds the set from explicit paths (tests, or embedding without a
    /// version-control checkout). Paths are taken as already canonical.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Whether edits may be applied to `path` (expected canonical).
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
