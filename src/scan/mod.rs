//! Source-tree scanners.
//!
//! Two complementary scanners over an addon's directory tree:
//!
//! - **lines**: applies named regular expressions to every line of every
//!   matching file. Strict: any unreadable file aborts the scan.
//! - **tree**: parses matching files with tree-sitter and yields syntax
//!   nodes. Tolerant: files that fail to parse are logged and skipped.
//!
//! Both scanners are pure and uncached; every call re-walks the tree.

mod lines;
pub(crate) mod tree;

pub use lines::scan_lines;
pub use tree::scan_tree;

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::AddonError;

/// Matches of one named pattern within one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// File the matches came from.
    pub file: PathBuf,
    /// Name of the pattern that matched.
    pub pattern: String,
    /// First capture group of every matching line, in file order.
    pub matches: Vec<String>,
}

/// Enumerates every file under `root` whose name passes `file_filter`.
///
/// Directory enumeration order is whatever the platform yields; consumers
/// that need determinism must sort. An unreadable directory aborts the
/// enumeration.
pub(crate) fn source_files<F>(root: &Path, file_filter: F) -> Result<Vec<PathBuf>, AddonError>
where
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| AddonError::Io(io::Error::from(err)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if file_filter(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
