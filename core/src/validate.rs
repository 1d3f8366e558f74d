//! Package layout validation.
//!
//! Checks a directory against the package rules and reports every problem
//! found, in a fixed order, so the same tree always yields the same list:
//!
//! 1. the folder name ends with [`PACKAGE_SUFFIX`];
//! 2. `extension.json` exists;
//! 3. when it exists, it parses as a JSON object (and, under
//!    [`ValidationRules::strict_manifest`], carries a `name`);
//! 4. some `.pushbutton` directory contains an entry script.
//!
//! # Examples
//!
//! ```
//! use clonebuddy_core::*;
//!
//! let dir = std::env::temp_dir().join("clonebuddy-doc-validate");
//! std::fs::create_dir_all(&dir).unwrap();
//!
//! let issues = validate_structure(&dir, ValidationRules::default());
//! assert!(issues.contains(&StructureIssue::MissingManifest));
//! assert!(issues.contains(&StructureIssue::MissingUiEntry));
//! # std::fs::remove_dir_all(&dir).ok();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::manifest::strip_bom;
use crate::package::{
    ENTRY_SCRIPT_EXTENSION, ExtensionPackage, MANIFEST_FILE_NAME, PACKAGE_SUFFIX, UI_ENTRY_SUFFIX,
    named_path,
};

/// One structural problem with a package directory.
///
/// Issues are ordinary results, not failures; the `Display` impl is the
/// human-readable description shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureIssue {
    /// Folder name lacks the package suffix.
    #[error("Folder name '{0}' must end with '{suffix}'", suffix = PACKAGE_SUFFIX)]
    MissingSuffix(String),
    /// No manifest file at the package root.
    #[error("Missing {file} file", file = MANIFEST_FILE_NAME)]
    MissingManifest,
    /// Manifest could not be read or is not a JSON object.
    #[error("{file} is invalid: {0}", file = MANIFEST_FILE_NAME)]
    InvalidManifest(String),
    /// Manifest parsed but has no `name` key (strict rules only).
    #[error("{file} missing 'name'", file = MANIFEST_FILE_NAME)]
    ManifestMissingName,
    /// No UI-entry directory with an entry script anywhere in the tree.
    #[error(
        "No {suffix} UI entry found (missing {suffix} folder with a .{ext} script)",
        suffix = UI_ENTRY_SUFFIX,
        ext = ENTRY_SCRIPT_EXTENSION
    )]
    MissingUiEntry,
}

impl StructureIssue {
    /// Returns `true` for issues the auto-fixer knows how to repair.
    pub fn is_auto_fixable(&self) -> bool {
        matches!(
            self,
            Self::MissingSuffix(_) | Self::MissingManifest | Self::MissingUiEntry
        )
    }
}

/// Optional rules layered on top of the base checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Also require a `name` key in the manifest.
    pub strict_manifest: bool,
}

impl ValidationRules {
    pub fn strict() -> Self {
        Self {
            strict_manifest: true,
        }
    }
}

/// Validates the package at `path` and returns every issue found.
///
/// Never fails: unreadable files and directories surface as issues or are
/// skipped. An empty list means the package is valid.
pub fn validate_structure(path: &Path, rules: ValidationRules) -> Vec<StructureIssue> {
    let package = ExtensionPackage::new(named_path(path));
    let mut issues = Vec::new();

    if !package.has_package_suffix() {
        issues.push(StructureIssue::MissingSuffix(package.folder_name()));
    }

    let manifest_path = package.manifest_path();
    if !manifest_path.is_file() {
        issues.push(StructureIssue::MissingManifest);
    } else {
        issues.extend(check_manifest(&manifest_path, rules));
    }

    if find_ui_entry(package.root_path()).is_none() {
        issues.push(StructureIssue::MissingUiEntry);
    }

    issues
}

fn check_manifest(path: &Path, rules: ValidationRules) -> Option<StructureIssue> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => return Some(StructureIssue::InvalidManifest(err.to_string())),
    };

    let value: Value = match serde_json::from_str(strip_bom(&raw)) {
        Ok(value) => value,
        Err(err) => return Some(StructureIssue::InvalidManifest(err.to_string())),
    };

    let Value::Object(fields) = value else {
        return Some(StructureIssue::InvalidManifest(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    };

    if rules.strict_manifest && !fields.contains_key("name") {
        return Some(StructureIssue::ManifestMissingName);
    }

    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Finds the first UI-entry directory under `root` (including `root`).
///
/// A UI-entry directory has a name ending in [`UI_ENTRY_SUFFIX`] and
/// directly contains at least one entry script. Directory entries are
/// visited in sorted order and symlinked directories are not followed.
pub fn find_ui_entry(root: &Path) -> Option<PathBuf> {
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };

        let mut children: Vec<(PathBuf, fs::FileType)> = entries
            .flatten()
            .filter_map(|entry| entry.file_type().ok().map(|kind| (entry.path(), kind)))
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));

        if is_ui_entry_dir(&dir) && children.iter().any(|(path, kind)| is_entry_script(path, kind))
        {
            return Some(dir);
        }

        // Reverse so the stack pops children in sorted order.
        for (path, kind) in children.into_iter().rev() {
            if kind.is_dir() {
                pending.push(path);
            }
        }
    }

    None
}

fn is_ui_entry_dir(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(UI_ENTRY_SUFFIX))
}

fn is_entry_script(path: &Path, kind: &fs::FileType) -> bool {
    let is_file = kind.is_file() || (kind.is_symlink() && path.is_file());
    is_file
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == ENTRY_SCRIPT_EXTENSION)
}
