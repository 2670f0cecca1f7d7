//! Error types for addon administration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by addon operations.
#[derive(Debug, Error)]
pub enum AddonError {
    /// The descriptor path cannot identify an addon (no parent directory
    /// or no directory name to derive a token from).
    #[error("Invalid descriptor path: {0}")]
    BadDescriptorPath(PathBuf),

    /// The manifest file does not evaluate to a literal mapping.
    #[error("Manifest is not a literal mapping: {0}")]
    ManifestSyntax(String),

    /// A required manifest key is absent.
    #[error("Manifest is missing required key `{0}`")]
    ManifestKeyMissing(&'static str),

    /// Filesystem error. Unreadable files abort line scans; link
    /// creation/removal failures also land here.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
