//! Target environment abstraction.
//!
//! The environment an addon is enabled into is an opaque capability: it
//! knows where enabled addons live and can spawn external commands. Keeping
//! it behind a trait lets tests substitute a recording implementation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A runtime environment addons can be enabled into.
pub trait Environment {
    /// Directory under which enabled addons are linked.
    fn addon_source_path(&self) -> &Path;

    /// Spawns an external command, best-effort.
    ///
    /// This is a tagged side effect: the result is ignored and no error is
    /// surfaced, so callers cannot accidentally turn it into a checked call.
    fn execute(&self, command: &str, args: &[String]);
}

/// An environment backed by the local filesystem and process table.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    addons_path: PathBuf,
}

impl SystemEnvironment {
    /// Creates an environment whose addons live under `addons_path`.
    #[must_use]
    pub fn new(addons_path: impl Into<PathBuf>) -> Self {
        Self {
            addons_path: addons_path.into(),
        }
    }
}

impl Environment for SystemEnvironment {
    fn addon_source_path(&self) -> &Path {
        &self.addons_path
    }

    fn execute(&self, command: &str, args: &[String]) {
        // Fire-and-forget: the child is not waited on and its exit status
        // is never inspected.
        match Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::debug!(command, pid = child.id(), "spawned detached command");
            }
            Err(err) => {
                tracing::warn!(command, %err, "failed to spawn command");
            }
        }
    }
}
