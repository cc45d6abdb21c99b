//! Resolution of tool-reported paths to canonical on-disk paths.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

/// Maps raw paths from the edit stream to canonical absolute paths.
///
/// A raw path either names an existing file directly or is relative to the
/// build directory the producing tool ran against. Resolution is a pure
/// function of the raw path and the build directory, so each raw path is
/// resolved at most once per run; the not-found report is likewise emitted
/// at most once per raw path.
#[derive(Debug)]
pub struct PathResolver {
    build_directory: PathBuf,
    cache: HashMap<String, Option<PathBuf>>,
}

impl PathResolver {
    pub fn new(build_directory: impl Into<PathBuf>) -> Self {
        Self {
            build_directory: build_directory.into(),
            cache: HashMap::new(),
        }
    }

    /// Canonicalizes `raw`, trying it as given and then under the build
    /// directory. `None` means no existing file under either
    /// interpretation; every edit targeting such a path is dropped.
    pub fn resolve(&mut self, raw: &str) -> Option<PathBuf> {
        if let Some(cached) = self.cache.get(raw) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(raw);
        if resolved.is_none() {
            eprintln!(
                "{}",
                format!("Edit applies to a non-existent file: {raw}").yellow()
            );
        }
        self.cache.insert(raw.to_string(), resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, raw: &str) -> Option<PathBuf> {
        let direct = Path::new(raw);
        if direct.is_file() {
            return fs::canonicalize(direct).ok();
        }

        let in_build_dir = self.build_directory.join(raw);
        if in_build_dir.is_file() {
            return fs::canonicalize(in_build_dir).ok();
        }

        None
    }
}
