//! Automatic repair of package layout issues.
//!
//! Each repair only fires when its precondition is unmet, so running the
//! fixer on a compliant package changes nothing. A failed step is logged and
//! recorded; the remaining steps still run. An existing manifest that does
//! not parse is never touched; only validation reports it.

use std::fs;
use std::path::{Path, PathBuf};

use clonebuddy_core::{ExtensionPackage, ManifestTemplate, PACKAGE_SUFFIX, named_path};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::error::{ProvisionError, Result};
use crate::log::LogSink;

/// Scaffolded UI-entry directory, relative to the package root.
pub const SAMPLE_ENTRY_DIR: [&str; 3] = ["tab", "SamplePanel", "Sample.pushbutton"];

/// Script written into the scaffolded UI-entry directory.
pub const SAMPLE_SCRIPT_NAME: &str = "script.py";

const SAMPLE_SCRIPT: &str =
    "# Sample pushbutton created by CloneBuddy\nprint('Hello from CloneBuddy!')\n";

/// One repair that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FixAction {
    /// Folder renamed to carry the package suffix.
    Renamed { to: String },
    /// Default manifest written.
    CreatedManifest,
    /// Sample tab/panel/pushbutton scaffold written.
    CreatedUiEntry,
}

impl std::fmt::Display for FixAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renamed { to } => write!(f, "Renamed folder to: {to}"),
            Self::CreatedManifest => write!(f, "Created default extension.json"),
            Self::CreatedUiEntry => write!(f, "Created sample tab/panel/pushbutton structure"),
        }
    }
}

/// Outcome of one auto-fix pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// Package path after the pass (differs from the input after a rename).
    pub path: PathBuf,
    pub applied: Vec<FixAction>,
    /// Human-readable descriptions of steps that failed.
    pub failures: Vec<String>,
}

impl FixReport {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Repairs the package at `path` and returns where it now lives.
///
/// Steps, in order: rename to add the package suffix, write a default
/// manifest when none exists, scaffold a sample UI entry when the tree has
/// none. The caller is responsible for validating again afterwards.
pub fn auto_fix(
    path: &Path,
    source_url: &str,
    config: &WorkflowConfig,
    log: &mut LogSink,
) -> FixReport {
    let path = &named_path(path);
    log.line(format!("Attempting to fix structure at: {}", path.display()));

    let mut report = FixReport {
        path: path.to_path_buf(),
        applied: Vec::new(),
        failures: Vec::new(),
    };

    match rename_with_suffix(path) {
        Ok(Some(new_path)) => {
            let to = ExtensionPackage::new(&new_path).folder_name();
            report.path = new_path;
            report.applied.push(FixAction::Renamed { to });
        }
        Ok(None) => {}
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Rename failed");
            report.failures.push(format!("Rename failed: {err}"));
        }
    }

    let package = ExtensionPackage::new(&report.path);

    if !package.has_manifest() {
        match write_default_manifest(&package, source_url, config) {
            Ok(()) => report.applied.push(FixAction::CreatedManifest),
            Err(err) => {
                warn!(path = %package.manifest_path().display(), error = %err, "Manifest write failed");
                report
                    .failures
                    .push(format!("Failed to write extension.json: {err}"));
            }
        }
    }

    if !package.has_ui_entry() {
        match write_sample_entry(package.root_path()) {
            Ok(()) => report.applied.push(FixAction::CreatedUiEntry),
            Err(err) => {
                warn!(path = %package.root_path().display(), error = %err, "Scaffold failed");
                report
                    .failures
                    .push(format!("Failed to create sample structure: {err}"));
            }
        }
    }

    for failure in &report.failures {
        log.line(failure);
    }
    if report.changed() {
        log.line("Auto-fix complete:");
        for action in &report.applied {
            log.line(format!("  {action}"));
        }
    } else if report.failures.is_empty() {
        log.line("No fixes needed - structure already valid");
    }

    report
}

/// Renames `path` to `<name>.extension` in the same parent.
///
/// Returns `Ok(None)` when the suffix is already present. An existing target
/// is never overwritten or merged into.
fn rename_with_suffix(path: &Path) -> Result<Option<PathBuf>> {
    let package = ExtensionPackage::new(path);
    if package.has_package_suffix() {
        return Ok(None);
    }

    let fixed_name = format!("{}{PACKAGE_SUFFIX}", package.folder_name());
    let target = path.with_file_name(&fixed_name);
    if target.exists() {
        return Err(ProvisionError::RenameCollision {
            from: path.to_path_buf(),
            to: target,
        });
    }

    debug!(from = %path.display(), to = %target.display(), "Renaming package folder");
    fs::rename(path, &target)?;
    Ok(Some(target))
}

fn write_default_manifest(
    package: &ExtensionPackage,
    source_url: &str,
    config: &WorkflowConfig,
) -> Result<()> {
    let manifest = ManifestTemplate::new(package.extension_name())
        .url(source_url)
        .author(config.manifest_author.as_str())
        .author_profile(config.manifest_author.as_str())
        .build();
    let mut raw = manifest.to_pretty_json()?;
    raw.push('\n');
    fs::write(package.manifest_path(), raw)?;
    Ok(())
}

fn write_sample_entry(root: &Path) -> Result<()> {
    let dir = SAMPLE_ENTRY_DIR
        .iter()
        .fold(root.to_path_buf(), |dir, part| dir.join(part));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(SAMPLE_SCRIPT_NAME), SAMPLE_SCRIPT)?;
    Ok(())
}
