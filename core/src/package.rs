use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::ExtensionManifest;
use crate::validate::find_ui_entry;

/// Folder-name suffix every package directory must carry.
pub const PACKAGE_SUFFIX: &str = ".extension";

/// Folder-name suffix that marks a UI-entry directory.
pub const UI_ENTRY_SUFFIX: &str = ".pushbutton";

/// File extension (without the dot) of an entry script.
pub const ENTRY_SCRIPT_EXTENSION: &str = "py";

/// Manifest file name at the package root.
pub const MANIFEST_FILE_NAME: &str = "extension.json";

/// Remote repository a package is cloned from.
///
/// The URL is only used to derive the local folder name; an explicit name
/// overrides the derivation.
///
/// # Examples
///
/// ```
/// use clonebuddy_core::RepositorySource;
///
/// let source = RepositorySource::new("https://github.com/org/pyM4B.git");
/// assert_eq!(source.extension_name(), "pyM4B.extension");
///
/// let named = RepositorySource::new("https://github.com/org/tools").with_name("Team");
/// assert_eq!(named.extension_name(), "Team.extension");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RepositorySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Local folder name for this source, always carrying [`PACKAGE_SUFFIX`].
    pub fn extension_name(&self) -> String {
        let stem = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => url_stem(&self.url).to_string(),
        };
        with_package_suffix(&stem)
    }

    /// Returns `true` when a non-empty folder stem can be derived.
    pub fn has_usable_name(&self) -> bool {
        !strip_package_suffix(&self.extension_name()).is_empty()
    }
}

/// Last path segment of a repository URL with a trailing `.git` removed.
fn url_stem(url: &str) -> &str {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    segment.strip_suffix(".git").unwrap_or(segment)
}

/// Appends [`PACKAGE_SUFFIX`] unless `name` already ends with it.
pub fn with_package_suffix(name: &str) -> String {
    if name.ends_with(PACKAGE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{PACKAGE_SUFFIX}")
    }
}

/// Removes one trailing [`PACKAGE_SUFFIX`], if present.
pub fn strip_package_suffix(name: &str) -> &str {
    name.strip_suffix(PACKAGE_SUFFIX).unwrap_or(name)
}

/// Returns `path` unchanged unless it has no final name component (`.`,
/// `..`, `foo/..`), in which case it is canonicalized so the package's real
/// folder name is visible. Unresolvable paths are returned as given.
pub fn named_path(path: &Path) -> PathBuf {
    if path.file_name().is_some() {
        return path.to_path_buf();
    }
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// A package directory on disk.
///
/// Nothing about the layout is enforced here; see
/// [`validate_structure`](crate::validate_structure) for the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPackage {
    root_path: PathBuf,
}

impl ExtensionPackage {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Basename of the package directory (lossy for non-UTF-8 names).
    pub fn folder_name(&self) -> String {
        self.root_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Folder name with the package suffix removed.
    pub fn extension_name(&self) -> String {
        strip_package_suffix(&self.folder_name()).to_string()
    }

    pub fn has_package_suffix(&self) -> bool {
        self.folder_name().ends_with(PACKAGE_SUFFIX)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root_path.join(MANIFEST_FILE_NAME)
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }

    pub fn has_ui_entry(&self) -> bool {
        find_ui_entry(&self.root_path).is_some()
    }

    /// Reads the typed manifest, `Ok(None)` when the file is absent.
    pub fn load_manifest(&self) -> Result<Option<ExtensionManifest>, ManifestReadError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let manifest = ExtensionManifest::from_json_str(&raw)?;
        Ok(Some(manifest))
    }
}

/// Failure reading or decoding a manifest file.
#[derive(Debug, thiserror::Error)]
pub enum ManifestReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
