//! Registration of packages with the host application CLI.
//!
//! The host is only ever asked three things: its environment report, to add
//! an extension, and to reload. Only exit status and the text of the `env`
//! report are consumed.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use clonebuddy_core::ExtensionPackage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{RegistrationCommand, WorkflowConfig};
use crate::error::{ProvisionError, Result};
use crate::log::LogSink;
use crate::process::{ToolOutput, run_tool};

/// Runs the host CLI with `args`, failing on a missing tool or non-zero
/// exit.
fn run_host(config: &WorkflowConfig, args: &[OsString]) -> Result<ToolOutput> {
    let host = config
        .search_path()
        .find(&config.host_cli)
        .ok_or_else(|| ProvisionError::MissingDependency(config.host_cli.clone()))?;

    let command = std::iter::once(config.host_cli.clone())
        .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");

    let output = run_tool(&host, args, &[], config.host_timeout())?;
    if output.success {
        Ok(output)
    } else {
        Err(ProvisionError::ToolFailed {
            command,
            detail: output.failure_detail(),
        })
    }
}

/// Lower-cased stdout and stderr of `<host-cli> env`.
pub fn environment_report(config: &WorkflowConfig) -> Result<String> {
    let output = run_host(config, &[OsString::from("env")])?;
    Ok(output.combined().to_lowercase())
}

/// Whether the host's environment report mentions `extension_name`.
///
/// Any failure to obtain the report counts as "not registered".
pub fn is_registered(config: &WorkflowConfig, extension_name: &str) -> bool {
    match environment_report(config) {
        Ok(report) => report.contains(&extension_name.to_lowercase()),
        Err(err) => {
            warn!(host_cli = %config.host_cli, error = %err, "Could not query host environment");
            false
        }
    }
}

/// Adds the package at `path` to the host.
pub fn register(
    config: &WorkflowConfig,
    extension_name: &str,
    path: &Path,
    log: &mut LogSink,
) -> Result<()> {
    register_with(config, config.registration_command, extension_name, path, log)
}

fn register_with(
    config: &WorkflowConfig,
    command: RegistrationCommand,
    extension_name: &str,
    path: &Path,
    log: &mut LogSink,
) -> Result<()> {
    let args = match command {
        RegistrationCommand::ExtensionsAdd => vec![
            OsString::from("extensions"),
            OsString::from("add"),
            OsString::from(extension_name),
            path.as_os_str().to_owned(),
        ],
        RegistrationCommand::ExtendExtensions => vec![
            OsString::from("extend"),
            OsString::from("extensions"),
            path.as_os_str().to_owned(),
        ],
    };

    log.line(format!("Registering extension: {extension_name}"));
    match run_host(config, &args) {
        Ok(_) => {
            debug!(name = extension_name, path = %path.display(), "Extension registered");
            Ok(())
        }
        Err(err) => {
            log.line(format!("Registration failed: {err}"));
            Err(err)
        }
    }
}

/// Asks the host to reload its extensions.
pub fn reload(config: &WorkflowConfig, log: &mut LogSink) -> Result<()> {
    log.line("Reloading host...");
    run_host(config, &[OsString::from("reload")]).inspect_err(|err| {
        log.line(format!("Reload failed: {err}"));
    })?;
    log.line("Reload complete.");
    Ok(())
}

/// What [`register_and_reload`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    AlreadyRegistered,
    Registered,
}

/// Registers the package at `path` and reloads, unless the host already
/// knows it.
pub fn register_and_reload(
    config: &WorkflowConfig,
    path: &Path,
    log: &mut LogSink,
) -> Result<Registration> {
    let name = ExtensionPackage::new(path).extension_name();
    if is_registered(config, &name) {
        log.line(format!("Extension '{name}' is already registered."));
        return Ok(Registration::AlreadyRegistered);
    }

    register(config, &name, path, log)?;
    reload(config, log)?;
    Ok(Registration::Registered)
}

/// Result of a [`refresh_extensions`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Folders newly added to the host.
    pub registered: Vec<PathBuf>,
    /// Folders the host already reported.
    pub already_loaded: Vec<PathBuf>,
    /// Folders whose registration failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    pub reloaded: bool,
}

/// Registers every package folder in the clone root that the host does not
/// report yet, then reloads once if anything was added.
///
/// Folders are matched by path against the lower-cased environment report,
/// and always registered with `extend extensions <path>`. When the report
/// cannot be obtained every folder counts as not loaded.
pub fn refresh_extensions(config: &WorkflowConfig, log: &mut LogSink) -> Result<RefreshReport> {
    let mut report = RefreshReport::default();
    let dirs = package_dirs(&config.clone_root)?;
    if dirs.is_empty() {
        log.line(format!(
            "No extensions found in {}",
            config.clone_root.display()
        ));
        return Ok(report);
    }

    let report_text = environment_report(config).unwrap_or_else(|err| {
        warn!(host_cli = %config.host_cli, error = %err, "Could not query host environment");
        String::new()
    });

    for path in dirs {
        let needle = path.to_string_lossy().to_lowercase();
        if report_text.contains(&needle) {
            debug!(path = %path.display(), "Already loaded");
            report.already_loaded.push(path);
            continue;
        }

        let name = ExtensionPackage::new(&path).extension_name();
        match register_with(
            config,
            RegistrationCommand::ExtendExtensions,
            &name,
            &path,
            log,
        ) {
            Ok(()) => report.registered.push(path),
            Err(err) => report.failed.push((path, err.to_string())),
        }
    }

    if report.registered.is_empty() {
        if report.failed.is_empty() {
            log.line("All extensions already loaded.");
        }
    } else {
        reload(config, log)?;
        report.reloaded = true;
    }
    Ok(report)
}

/// Directories in `root` whose names carry the package suffix, sorted.
fn package_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && ExtensionPackage::new(&path).has_package_suffix() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
