//! Workflow configuration.
//!
//! Everything the workflow needs to know about its environment lives in one
//! [`WorkflowConfig`] value that is built once and passed to each
//! component. It round-trips through YAML and every field has a default, so
//! a config file only needs the keys it changes.
//!
//! # Example YAML
//!
//! ```yaml
//! clone_root: /home/me/CloneBuddyExtensions
//! vcs_tool: git
//! host_cli: pyrevit
//! strict_manifest_check: true
//! register_after_fix: true
//! registration_command: extend_extensions
//! host_timeout_secs: 30
//! repositories:
//!   - https://github.com/eirannejad/pyRevit-Search
//! ```

use std::ffi::OsString;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clonebuddy_core::{DEFAULT_AUTHOR, ValidationRules};
use serde::{Deserialize, Serialize};

use crate::command::SearchPath;
use crate::error::Result;

/// Repository cloned when the CLI is run without a URL.
pub const DEFAULT_SAMPLE_URL: &str = "https://github.com/0neo/pyRevit.neoCL";

/// Repositories processed by a batch run when none are configured.
pub const DEFAULT_BATCH_REPOSITORIES: &[&str] = &[
    "https://github.com/GiuseppeDotto/pyM4B.extension",
    "https://github.com/eirannejad/pyRevit-Search",
    "https://github.com/marius311/pyRevit.neoCL",
    "https://github.com/derangedhk/pyRevit.Translator",
    "https://github.com/OpenRevit/pyrevit.sheetlink.extension",
];

/// Host CLI invocation used to register a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationCommand {
    /// `<host-cli> extensions add <name> <path>`
    #[default]
    ExtensionsAdd,
    /// `<host-cli> extend extensions <path>`
    ExtendExtensions,
}

/// Settings shared by every workflow component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Directory repositories are cloned into.
    pub clone_root: PathBuf,
    /// Version-control client executable name.
    pub vcs_tool: String,
    /// Host application CLI executable name.
    pub host_cli: String,
    /// Console tag for single-repository runs.
    pub log_tag: String,
    /// Console tag for batch runs.
    pub batch_log_tag: String,
    /// Append-mode log file for batch runs (`None` disables it).
    pub batch_log_file: Option<PathBuf>,
    /// Also require a `name` key in manifests.
    pub strict_manifest_check: bool,
    /// Validate again after auto-fix in single-repository runs.
    pub revalidate_after_fix: bool,
    /// Register with the host after a successful single-repository run.
    pub register_after_fix: bool,
    pub registration_command: RegistrationCommand,
    /// Author written into synthesized manifests.
    pub manifest_author: String,
    /// Kill the clone after this many seconds (`None` waits forever).
    pub clone_timeout_secs: Option<u64>,
    /// Kill host CLI calls after this many seconds.
    pub host_timeout_secs: Option<u64>,
    /// Repositories processed by a batch run.
    pub repositories: Vec<String>,
    /// Overrides `PATH` for tool lookup.
    #[serde(skip)]
    pub search_path: Option<OsString>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let home = home_dir();
        Self {
            clone_root: home.join("CloneBuddyExtensions"),
            vcs_tool: "git".to_string(),
            host_cli: "pyrevit".to_string(),
            log_tag: "CloneBuddy".to_string(),
            batch_log_tag: "BatchCloneBuddy".to_string(),
            batch_log_file: Some(home.join("CloneBuddyBatchLog.txt")),
            strict_manifest_check: false,
            revalidate_after_fix: true,
            register_after_fix: false,
            registration_command: RegistrationCommand::default(),
            manifest_author: DEFAULT_AUTHOR.to_string(),
            clone_timeout_secs: None,
            host_timeout_secs: Some(60),
            repositories: DEFAULT_BATCH_REPOSITORIES
                .iter()
                .map(|url| url.to_string())
                .collect(),
            search_path: None,
        }
    }
}

impl WorkflowConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ProvisionError::Io) if the file cannot be read,
    /// or [`Yaml`](crate::ProvisionError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn with_clone_root(mut self, clone_root: impl Into<PathBuf>) -> Self {
        self.clone_root = clone_root.into();
        self
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Directories searched for the external tools.
    pub fn search_path(&self) -> SearchPath {
        match &self.search_path {
            Some(value) => SearchPath::parse(value),
            None => SearchPath::from_env(),
        }
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            strict_manifest: self.strict_manifest_check,
        }
    }

    pub fn clone_timeout(&self) -> Option<Duration> {
        self.clone_timeout_secs.map(Duration::from_secs)
    }

    pub fn host_timeout(&self) -> Option<Duration> {
        self.host_timeout_secs.map(Duration::from_secs)
    }
}

/// The user's home directory from `HOME`, then `USERPROFILE`.
pub fn home_dir() -> PathBuf {
    for key in ["HOME", "USERPROFILE"] {
        if let Some(value) = std::env::var_os(key).filter(|value| !value.is_empty()) {
            return PathBuf::from(value);
        }
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert!(config.clone_root.ends_with("CloneBuddyExtensions"));
        assert_eq!(config.vcs_tool, "git");
        assert_eq!(config.host_cli, "pyrevit");
        assert_eq!(config.repositories.len(), DEFAULT_BATCH_REPOSITORIES.len());
        assert!(config.revalidate_after_fix);
        assert!(!config.register_after_fix);
        assert_eq!(config.clone_timeout(), None);
        assert_eq!(config.host_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.validation_rules(), ValidationRules::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
clone_root: /srv/extensions
strict_manifest_check: true
registration_command: extend_extensions
repositories:
  - https://github.com/org/one
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.clone_root, PathBuf::from("/srv/extensions"));
        assert!(config.validation_rules().strict_manifest);
        assert_eq!(
            config.registration_command,
            RegistrationCommand::ExtendExtensions
        );
        assert_eq!(config.repositories, vec!["https://github.com/org/one"]);
        assert_eq!(config.vcs_tool, "git");
        assert_eq!(config.log_tag, "CloneBuddy");
    }

    #[test]
    fn test_load_save_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("clonebuddy.yml");

        let mut original = WorkflowConfig::default().with_clone_root(tmp.path().join("root"));
        original.host_cli = "pyrevit-cli".to_string();
        original.clone_timeout_secs = Some(300);
        original.batch_log_file = None;
        original.save(&path).unwrap();

        let loaded = WorkflowConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_search_path_override() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("git"), "").unwrap();

        let config = WorkflowConfig::default().with_search_path(tmp.path().as_os_str());
        assert!(config.search_path().contains("git"));
    }
}
