//! Cloning repositories into the clone root.

use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use clonebuddy_core::RepositorySource;
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::error::{ProvisionError, Result};
use crate::log::LogSink;
use crate::process::run_tool;

/// Environment for the version-control client (no interactive prompts).
const VCS_ENV: &[(&str, &str)] = &[("GIT_TERMINAL_PROMPT", "0")];

/// Local path a source would be cloned to.
pub fn clone_destination(config: &WorkflowConfig, source: &RepositorySource) -> PathBuf {
    config.clone_root.join(source.extension_name())
}

/// Clones `source` into the clone root and returns the package path.
///
/// An existing destination is returned as-is without running the
/// version-control client, so calling this twice is safe. Failures are
/// logged with the client's stderr and returned as
/// [`ProvisionError::CloneFailed`]; nothing is retried.
pub fn clone_repository(
    config: &WorkflowConfig,
    source: &RepositorySource,
    log: &mut LogSink,
) -> Result<PathBuf> {
    if !source.has_usable_name() {
        log.line(format!(
            "Cannot derive an extension name from '{}'",
            source.url
        ));
        return Err(ProvisionError::InvalidSource(source.url.clone()));
    }

    let local_path = clone_destination(config, source);
    if local_path.exists() {
        log.line(format!(
            "Folder already exists: {}. Skipping clone.",
            local_path.display()
        ));
        return Ok(local_path);
    }

    let Some(vcs) = config.search_path().find(&config.vcs_tool) else {
        log.line(format!("{} is not available on PATH.", config.vcs_tool));
        return Err(ProvisionError::MissingDependency(config.vcs_tool.clone()));
    };

    fs::create_dir_all(&config.clone_root)?;
    log.line(format!("Cloning into: {}", local_path.display()));
    debug!(url = %source.url, path = %local_path.display(), vcs = %vcs.display(), "Cloning repository");

    let args = [
        OsStr::new("clone"),
        OsStr::new(&source.url),
        local_path.as_os_str(),
    ];
    let detail = match run_tool(&vcs, args, VCS_ENV, config.clone_timeout()) {
        Ok(output) if output.success => {
            log.line("Repo cloned successfully.");
            return Ok(local_path);
        }
        Ok(output) => output.failure_detail(),
        Err(err) => format!("could not launch {}: {err}", config.vcs_tool),
    };

    warn!(url = %source.url, detail = %detail, "Clone failed");
    log.line(format!("Git clone failed: {detail}"));
    Err(ProvisionError::CloneFailed {
        url: source.url.clone(),
        detail,
    })
}
