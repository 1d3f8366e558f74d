//! Health check over everything in the clone root.

use std::fs;
use std::path::{Path, PathBuf};

use clonebuddy_core::{ExtensionPackage, StructureIssue, ValidationRules, validate_structure};
use tracing::warn;

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::log::LogSink;
use crate::registration::environment_report;

/// Status of one folder in the clone root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub folder: String,
    pub path: PathBuf,
    /// The host's environment report mentions this folder.
    pub loaded: bool,
    pub issues: Vec<StructureIssue>,
}

impl ScanEntry {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Every directory directly inside `root`, sorted by path.
///
/// A missing root yields an empty list.
pub fn list_extension_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Validates every folder in the clone root with strict manifest rules and
/// looks each one up in the host's environment report.
///
/// When the report cannot be obtained every folder is shown as not loaded.
pub fn check_extensions(config: &WorkflowConfig, log: &mut LogSink) -> Result<Vec<ScanEntry>> {
    let dirs = list_extension_dirs(&config.clone_root)?;
    if dirs.is_empty() {
        log.line(format!(
            "No extensions found in {}",
            config.clone_root.display()
        ));
        return Ok(Vec::new());
    }

    let report = environment_report(config).unwrap_or_else(|err| {
        warn!(error = %err, "Host environment unavailable, load status unknown");
        String::new()
    });

    let mut entries = Vec::with_capacity(dirs.len());
    for path in dirs {
        let folder = ExtensionPackage::new(&path).folder_name();
        let issues = validate_structure(&path, ValidationRules::strict());
        let loaded = report.contains(&folder.to_lowercase());

        log.line(format!("{folder}:"));
        if issues.is_empty() {
            log.line("  Structure OK");
        } else {
            for issue in &issues {
                log.line(format!("  - {issue}"));
            }
        }
        log.line(if loaded {
            "  Loaded in host"
        } else {
            "  Not loaded in host"
        });

        entries.push(ScanEntry {
            folder,
            path,
            loaded,
            issues,
        });
    }
    Ok(entries)
}
