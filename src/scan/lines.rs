//! Line-pattern scanning.

use std::fs;
use std::path::Path;

use regex::Regex;

use super::{ScanResult, source_files};
use crate::error::AddonError;

/// Applies named patterns to every line of every matching file under `root`.
///
/// For each retained file and each named pattern, collects the first capture
/// group of every matching line, in file order. A (file, pattern) pair with
/// no matches is omitted entirely. Cross-file ordering is undefined.
///
/// Any file that cannot be read aborts the whole scan with the I/O error;
/// there is no per-file recovery here, unlike [`super::scan_tree`].
pub fn scan_lines<F>(
    root: &Path,
    file_filter: F,
    patterns: &[(&str, &Regex)],
) -> Result<Vec<ScanResult>, AddonError>
where
    F: Fn(&str) -> bool,
{
    let mut results = Vec::new();
    for file in source_files(root, file_filter)? {
        let text = fs::read_to_string(&file)?;
        for (name, pattern) in patterns {
            let matches: Vec<String> = text
                .lines()
                .filter_map(|line| pattern.captures(line))
                .filter_map(|captures| captures.get(1))
                .map(|group| group.as_str().to_string())
                .collect();
            if !matches.is_empty() {
                results.push(ScanResult {
                    file: file.clone(),
                    pattern: (*name).to_string(),
                    matches,
                });
            }
        }
    }
    Ok(results)
}
