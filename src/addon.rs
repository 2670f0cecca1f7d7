//! Addon identity and manifest access.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::AddonError;
use crate::manifest::{Manifest, Value};

/// One installable addon, identified by its descriptor file.
///
/// The descriptor path, its parent directory, and the token derived from the
/// directory name are fixed at construction. The manifest is loaded lazily
/// and at most once; later reads return the cached mapping even if the file
/// changes on disk.
#[derive(Debug, Clone)]
pub struct Addon {
    descriptor_path: PathBuf,
    source_dir: PathBuf,
    token: String,
    manifest: OnceLock<Manifest>,
}

impl Addon {
    /// Creates an addon from the path of its descriptor file.
    ///
    /// The path is made absolute without touching the filesystem; the file
    /// itself is only read when the manifest is first needed.
    pub fn new(descriptor_path: impl AsRef<Path>) -> Result<Self, AddonError> {
        let descriptor_path = std::path::absolute(descriptor_path.as_ref())?;
        let source_dir = descriptor_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| AddonError::BadDescriptorPath(descriptor_path.clone()))?;
        let token = source_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AddonError::BadDescriptorPath(descriptor_path.clone()))?;

        Ok(Self {
            descriptor_path,
            source_dir,
            token,
            manifest: OnceLock::new(),
        })
    }

    /// Absolute path of the descriptor file.
    #[must_use]
    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    /// Directory holding the addon's sources.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The addon's unique short identifier, the base name of its source
    /// directory. Used as the install-path leaf name.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The manifest, loaded on first access and cached for the lifetime of
    /// this instance. A failed load is not cached; the next call retries.
    pub fn manifest(&self) -> Result<&Manifest, AddonError> {
        if let Some(manifest) = self.manifest.get() {
            return Ok(manifest);
        }
        let loaded = Manifest::load(&self.descriptor_path)?;
        Ok(self.manifest.get_or_init(|| loaded))
    }

    /// The addon's short description. Required.
    pub fn name(&self) -> Result<&str, AddonError> {
        self.manifest()?
            .get("name")
            .and_then(Value::as_str)
            .ok_or(AddonError::ManifestKeyMissing("name"))
    }

    /// The addon's long description, or the empty string.
    pub fn description(&self) -> Result<&str, AddonError> {
        Ok(self
            .manifest()?
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(""))
    }

    /// Tokens of the addons this addon depends on.
    pub fn depends(&self) -> Result<Vec<&str>, AddonError> {
        Ok(self
            .manifest()?
            .get("depends")
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default())
    }

    /// The addon's website, if declared.
    pub fn website(&self) -> Result<Option<&str>, AddonError> {
        Ok(self.manifest()?.get("website").and_then(Value::as_str))
    }

    /// The addon's author, if declared.
    pub fn author(&self) -> Result<Option<&str>, AddonError> {
        Ok(self.manifest()?.get("author").and_then(Value::as_str))
    }

    /// The addon's version, if declared.
    pub fn version(&self) -> Result<Option<&str>, AddonError> {
        Ok(self.manifest()?.get("version").and_then(Value::as_str))
    }

    /// External dependencies keyed by ecosystem name (e.g. `python`).
    pub fn external_dependencies(&self) -> Result<Option<&BTreeMap<String, Value>>, AddonError> {
        Ok(self
            .manifest()?
            .get("external_dependencies")
            .and_then(Value::as_map))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_addon(dir: &Path, token: &str, manifest: &str) -> Addon {
        let source = dir.join(token);
        fs::create_dir_all(&source).unwrap();
        let descriptor = source.join("__openerp__.py");
        fs::write(&descriptor, manifest).unwrap();
        Addon::new(&descriptor).unwrap()
    }

    #[test]
    fn test_token_is_source_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let addon = write_addon(dir.path(), "sale_extra", "{'name': 'Sale Extra'}");

        assert_eq!(addon.token(), "sale_extra");
        assert_eq!(addon.source_dir(), dir.path().join("sale_extra"));
        assert_eq!(
            addon.descriptor_path(),
            dir.path().join("sale_extra/__openerp__.py")
        );
    }

    #[test]
    fn test_manifest_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let addon = write_addon(
            dir.path(),
            "sale_extra",
            "{'name': 'Sale Extra', 'depends': ['sale'], 'version': '1.0'}",
        );

        assert_eq!(addon.name().unwrap(), "Sale Extra");
        assert_eq!(addon.depends().unwrap(), vec!["sale"]);
        assert_eq!(addon.version().unwrap(), Some("1.0"));
        assert_eq!(addon.website().unwrap(), None);
        assert_eq!(addon.author().unwrap(), None);
        assert_eq!(addon.description().unwrap(), "");
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let addon = write_addon(dir.path(), "anon", "{'depends': []}");

        assert!(matches!(
            addon.name(),
            Err(AddonError::ManifestKeyMissing("name"))
        ));
    }

    #[test]
    fn test_manifest_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let addon = write_addon(dir.path(), "cached", "{'name': 'First'}");

        assert_eq!(addon.name().unwrap(), "First");
        fs::write(addon.descriptor_path(), "{'name': 'Second'}").unwrap();
        assert_eq!(addon.name().unwrap(), "First");
    }

    #[test]
    fn test_failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let addon = write_addon(dir.path(), "late", "not a mapping");

        assert!(addon.name().is_err());
        fs::write(addon.descriptor_path(), "{'name': 'Fixed'}").unwrap();
        assert_eq!(addon.name().unwrap(), "Fixed");
    }
}
