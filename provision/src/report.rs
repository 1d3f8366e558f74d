//! Per-repository outcomes and the batch summary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use clonebuddy_core::StructureIssue;
use serde::Serialize;

use crate::fix::FixAction;

/// Final state of one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    /// Structure is valid; registration was not requested.
    Valid,
    /// Structure is valid and the host knows the package.
    Registered,
    /// Issues remained after auto-fix.
    UnresolvedIssues,
    CloneFailed,
    /// Any other error (host CLI, I/O).
    Failed,
}

impl RepoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Registered => "registered",
            Self::UnresolvedIssues => "unresolved_issues",
            Self::CloneFailed => "clone_failed",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Valid | Self::Registered)
    }
}

impl std::fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoOutcome {
    pub url: String,
    /// Package path after clone and fixes, when the clone succeeded.
    pub path: Option<PathBuf>,
    pub status: RepoStatus,
    pub issues_before: Vec<String>,
    pub fixes: Vec<FixAction>,
    /// Auto-fix steps that failed.
    pub fix_failures: Vec<String>,
    pub remaining_issues: Vec<String>,
    pub registered: bool,
    pub error: Option<String>,
}

impl RepoOutcome {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
            status: RepoStatus::Failed,
            issues_before: Vec::new(),
            fixes: Vec::new(),
            fix_failures: Vec::new(),
            remaining_issues: Vec::new(),
            registered: false,
            error: None,
        }
    }

    pub(crate) fn failed(mut self, status: RepoStatus, error: impl ToString) -> Self {
        self.status = status;
        self.error = Some(error.to_string());
        self
    }
}

pub(crate) fn issue_strings(issues: &[StructureIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

/// Outcomes of a batch run, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// RFC 3339 timestamp of when the batch started.
    pub generated_at: String,
    pub outcomes: Vec<RepoOutcome>,
}

impl BatchReport {
    pub fn new(started: DateTime<Utc>) -> Self {
        Self {
            generated_at: started.to_rfc3339_opts(SecondsFormat::Secs, true),
            outcomes: Vec::new(),
        }
    }

    /// Number of outcomes per status.
    pub fn summary(&self) -> BTreeMap<RepoStatus, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.status).or_default() += 1;
        }
        counts
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_success())
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn outcome(url: &str, status: RepoStatus) -> RepoOutcome {
        RepoOutcome {
            status,
            ..RepoOutcome::new(url)
        }
    }

    #[test]
    fn test_summary_counts_statuses() {
        let mut report = BatchReport::new(Utc::now());
        report.outcomes = vec![
            outcome("a", RepoStatus::Registered),
            outcome("b", RepoStatus::CloneFailed),
            outcome("c", RepoStatus::Registered),
            outcome("d", RepoStatus::UnresolvedIssues),
        ];

        let summary = report.summary();
        assert_eq!(summary[&RepoStatus::Registered], 2);
        assert_eq!(summary[&RepoStatus::CloneFailed], 1);
        assert!(!summary.contains_key(&RepoStatus::Failed));
        assert_eq!(report.succeeded(), 2);
    }

    #[test]
    fn test_json_shape() {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let mut report = BatchReport::new(started);
        report.outcomes.push(
            RepoOutcome::new("https://github.com/org/bad")
                .failed(RepoStatus::CloneFailed, "repository not found"),
        );

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["generated_at"], "2024-05-01T12:30:00Z");
        let first = &value["outcomes"][0];
        assert_eq!(first["status"], "clone_failed");
        assert_eq!(first["error"], "repository not found");
        assert_eq!(first["path"], serde_json::Value::Null);
        assert_eq!(first["registered"], false);
    }

    #[test]
    fn test_issue_strings_use_display() {
        let issues = [StructureIssue::MissingManifest];
        assert_eq!(issue_strings(&issues), vec!["Missing extension.json file"]);
    }
}
