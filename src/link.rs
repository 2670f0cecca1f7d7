//! Addon activation via filesystem links.
//!
//! An addon is enabled in an environment by a symbolic link named after its
//! token, placed directly under the environment's addon source path and
//! pointing at the addon's own source directory. Enabling and disabling are
//! transitions of an explicit four-state machine derived from the
//! filesystem, never stored.
//!
//! Checks and mutations are separate syscalls with no transactional
//! wrapping; the design assumes a single administrative actor, and a link
//! vanishing between check and act surfaces as the underlying I/O error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::addon::Addon;
use crate::env::Environment;
use crate::error::AddonError;
use crate::manifest::Value;

/// Link state of one (addon, environment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No entry at the install path.
    Unlinked,
    /// An entry exists but its resolved target is missing.
    Dangling,
    /// The entry resolves back into the addon's own source directory.
    /// Counted as not enabled.
    LinkedSelf,
    /// The entry resolves to an existing target outside the addon's own
    /// source directory.
    LinkedValid,
}

impl LinkState {
    /// Whether this state counts as enabled.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, LinkState::LinkedValid)
    }

    /// Whether this state is free of a dangling link.
    #[must_use]
    pub fn is_saned(self) -> bool {
        !matches!(self, LinkState::Dangling)
    }
}

impl Addon {
    /// Where this addon is (or would be) installed in the environment.
    #[must_use]
    pub fn install_path(&self, env: &dyn Environment) -> PathBuf {
        env.addon_source_path().join(self.token())
    }

    /// Derives the current link state from the filesystem.
    ///
    /// `LinkedSelf` preserves the historical exclusion: an install path
    /// whose resolved target sits directly inside the addon's own source
    /// directory is not counted as enabled. Whether that exclusion is
    /// policy or a latent defect is an open product question; the behavior
    /// is kept as-is.
    #[must_use]
    pub fn link_state(&self, env: &dyn Environment) -> LinkState {
        let install_path = self.install_path(env);
        if fs::symlink_metadata(&install_path).is_err() {
            return LinkState::Unlinked;
        }
        let Ok(resolved) = fs::canonicalize(&install_path) else {
            return LinkState::Dangling;
        };
        match resolved.parent() {
            Some(parent) if parent == self.source_dir() => LinkState::LinkedSelf,
            _ => LinkState::LinkedValid,
        }
    }

    /// True iff the addon is enabled in the environment.
    #[must_use]
    pub fn is_enabled(&self, env: &dyn Environment) -> bool {
        self.link_state(env).is_enabled()
    }

    /// True iff the install path is free of a dangling link.
    #[must_use]
    pub fn is_saned(&self, env: &dyn Environment) -> bool {
        self.link_state(env).is_saned()
    }

    /// Enables this addon in the environment. Does not check depends.
    ///
    /// Returns `false` only when the addon is already enabled and `force`
    /// is not set; enabling is idempotent. With `force`, an existing link
    /// is replaced even when it is broken or self-referential.
    pub fn enable(&self, env: &dyn Environment, force: bool) -> Result<bool, AddonError> {
        let install_path = self.install_path(env);
        let state = self.link_state(env);
        let was_enabled = state.is_enabled();
        let was_saned = state.is_saned();
        let entry_exists = install_path.exists();
        let is_link = fs::symlink_metadata(&install_path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);

        if is_link {
            if (force && (entry_exists || was_enabled)) || !was_saned {
                tracing::debug!(
                    addon = self.token(),
                    state = ?state,
                    "removing existing link before enable"
                );
                fs::remove_file(&install_path)?;
            } else if was_enabled && !force {
                return Ok(false);
            }
            // A saned link that does not count as enabled is left in place.
        }

        if !install_path.exists() {
            symlink_dir(self.source_dir(), &install_path)?;
            tracing::debug!(
                addon = self.token(),
                target = %self.source_dir().display(),
                "enabled"
            );
        }
        Ok(true)
    }

    /// Disables this addon in the environment. Does not check depends.
    ///
    /// Returns `true` when the install entry was removed, or when the addon
    /// was already disabled and `force` is set.
    pub fn disable(&self, env: &dyn Environment, force: bool) -> Result<bool, AddonError> {
        let install_path = self.install_path(env);
        if self.is_enabled(env) {
            fs::remove_file(&install_path)?;
            tracing::debug!(addon = self.token(), "disabled");
            return Ok(true);
        }
        if force {
            return Ok(true);
        }
        Ok(false)
    }

    /// Installs the addon's external python dependencies, best-effort.
    ///
    /// Invokes `pip install <module>` through the environment once per
    /// listed module, in manifest order. Results are ignored; an
    /// installation failure is neither detected nor surfaced.
    pub fn install_external_dependencies(&self, env: &dyn Environment) -> Result<(), AddonError> {
        let Some(externals) = self.external_dependencies()? else {
            return Ok(());
        };
        let Some(python) = externals.get("python").and_then(Value::as_list) else {
            return Ok(());
        };
        for module in python.iter().filter_map(Value::as_str) {
            env.execute("pip", &["install".to_string(), module.to_string()]);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
