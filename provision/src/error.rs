//! Error types for provisioning operations.
//!
//! Structural problems with a package are not errors (see
//! [`StructureIssue`](clonebuddy_core::StructureIssue)); this type covers
//! what stops a unit of work: missing tools, failed clones, I/O and
//! configuration failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while provisioning a repository.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A required external tool is not on the search path.
    #[error("'{0}' is not available on PATH")]
    MissingDependency(String),

    /// The version-control client failed to clone a repository.
    #[error("clone of '{url}' failed: {detail}")]
    CloneFailed { url: String, detail: String },

    /// No folder name can be derived from the repository source.
    #[error("cannot derive an extension name from '{0}'")]
    InvalidSource(String),

    /// A rename target already exists.
    #[error("cannot rename '{}' to '{}': target already exists", from.display(), to.display())]
    RenameCollision { from: PathBuf, to: PathBuf },

    /// An external tool ran but reported failure.
    #[error("`{command}` failed: {detail}")]
    ToolFailed { command: String, detail: String },

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ProvisionError`].
pub type Result<T> = std::result::Result<T, ProvisionError>;
