//! Clone, validate, fix and register, for one repository or many.

use std::path::Path;

use chrono::Utc;
use clonebuddy_core::{RepositorySource, StructureIssue, ValidationRules, validate_structure};
use tracing::{debug, warn};

use crate::clone::clone_repository;
use crate::config::WorkflowConfig;
use crate::error::{ProvisionError, Result};
use crate::fix::auto_fix;
use crate::log::LogSink;
use crate::registration::register_and_reload;
use crate::report::{BatchReport, RepoOutcome, RepoStatus, issue_strings};

/// Fails with [`ProvisionError::MissingDependency`] unless both the
/// version-control client and the host CLI are on the search path.
pub fn check_required_tools(config: &WorkflowConfig, log: &mut LogSink) -> Result<()> {
    let search_path = config.search_path();
    for tool in [&config.vcs_tool, &config.host_cli] {
        if !search_path.contains(tool) {
            log.line(format!("{tool} is not installed or not on PATH."));
            return Err(ProvisionError::MissingDependency(tool.clone()));
        }
    }
    Ok(())
}

/// Validates `path` and logs each issue found.
pub fn validate_and_log(
    path: &Path,
    rules: ValidationRules,
    log: &mut LogSink,
) -> Vec<StructureIssue> {
    log.line(format!("Validating structure at: {}", path.display()));
    let issues = validate_structure(path, rules);
    if issues.is_empty() {
        log.line("Structure is valid.");
    } else {
        log.line("Structure issues found:");
        for issue in &issues {
            log.line(format!("  - {issue}"));
        }
    }
    issues
}

/// Per-run switches for [`process_repository`].
#[derive(Debug, Clone, Copy)]
struct Steps {
    revalidate: bool,
    register: bool,
}

/// Runs the workflow for a single repository.
///
/// Missing tools abort with an error before anything is cloned. Every
/// later failure, including a failed clone, is reported in the returned
/// outcome.
pub fn run_single(config: &WorkflowConfig, url: &str, log: &mut LogSink) -> Result<RepoOutcome> {
    check_required_tools(config, log)?;
    let steps = Steps {
        revalidate: config.revalidate_after_fix,
        register: config.register_after_fix,
    };
    Ok(process_repository(config, url, steps, log))
}

/// Runs the workflow for each URL in order, always re-validating and
/// registering packages that end up valid.
///
/// One URL failing never stops the batch; its outcome records why.
pub fn run_batch<S: AsRef<str>>(
    config: &WorkflowConfig,
    urls: &[S],
    log: &mut LogSink,
) -> Result<BatchReport> {
    let mut report = BatchReport::new(Utc::now());
    check_required_tools(config, log)?;

    let steps = Steps {
        revalidate: true,
        register: true,
    };
    for url in urls {
        let url = url.as_ref();
        log.line("");
        log.line(format!("Processing: {url}"));

        let outcome = process_repository(config, url, steps, log);
        match outcome.status {
            RepoStatus::Registered => log.line("Fully processed and registered!"),
            RepoStatus::CloneFailed => log.line("Skipped: clone failed."),
            RepoStatus::Failed => log.line(format!(
                "Unexpected error: {}",
                outcome.error.as_deref().unwrap_or("unknown")
            )),
            RepoStatus::Valid | RepoStatus::UnresolvedIssues => {}
        }
        report.outcomes.push(outcome);
    }

    log.line("");
    log.line(format!(
        "Batch complete: {}/{} repositories processed successfully.",
        report.succeeded(),
        report.outcomes.len()
    ));
    if let Some(path) = log.file_path().map(Path::to_path_buf) {
        log.line(format!("Log saved at: {}", path.display()));
    }
    Ok(report)
}

/// Opens the batch log, falling back to console-only output when the
/// configured file cannot be opened.
pub fn open_batch_log(config: &WorkflowConfig) -> LogSink {
    let tag = config.batch_log_tag.as_str();
    let Some(path) = &config.batch_log_file else {
        return LogSink::new(tag);
    };
    LogSink::new(tag).with_file(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "Could not open batch log file");
        LogSink::new(tag)
    })
}

fn process_repository(
    config: &WorkflowConfig,
    url: &str,
    steps: Steps,
    log: &mut LogSink,
) -> RepoOutcome {
    let mut outcome = RepoOutcome::new(url);
    let source = RepositorySource::new(url);

    let mut path = match clone_repository(config, &source, log) {
        Ok(path) => path,
        Err(err @ (ProvisionError::CloneFailed { .. } | ProvisionError::InvalidSource(_))) => {
            return outcome.failed(RepoStatus::CloneFailed, err);
        }
        Err(err) => return outcome.failed(RepoStatus::Failed, err),
    };

    let rules = config.validation_rules();
    let issues = validate_and_log(&path, rules, log);
    outcome.issues_before = issue_strings(&issues);

    if !issues.is_empty() {
        let fix = auto_fix(&path, &source.url, config, log);
        path = fix.path;
        outcome.fixes = fix.applied;
        outcome.fix_failures = fix.failures;

        if steps.revalidate {
            let remaining = validate_and_log(&path, rules, log);
            outcome.remaining_issues = issue_strings(&remaining);
        } else {
            debug!(path = %path.display(), "Re-validation disabled");
        }
    }
    outcome.path = Some(path.clone());

    let resolved = outcome.remaining_issues.is_empty() && outcome.fix_failures.is_empty();
    if !resolved {
        log.line("Extension has unresolved issues. Skipping registration.");
        outcome.status = RepoStatus::UnresolvedIssues;
        return outcome;
    }

    if !steps.register {
        outcome.status = RepoStatus::Valid;
        return outcome;
    }

    match register_and_reload(config, &path, log) {
        Ok(_) => {
            outcome.registered = true;
            outcome.status = RepoStatus::Registered;
            outcome
        }
        Err(err) => outcome.failed(RepoStatus::Failed, err),
    }
}
