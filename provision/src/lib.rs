//! Cloning, repairing and registering extension repositories.
//!
//! This crate drives the external tools around an extension package: the
//! version-control client that fetches it and the host application CLI that
//! loads it. Package layout rules themselves live in `clonebuddy_core`.
//!
//! # Main entry points
//!
//! - [`workflow::run_single`]: clone one repository, validate, auto-fix,
//!   re-validate and optionally register it.
//! - [`workflow::run_batch`]: the same for a list of URLs, recording one
//!   [`RepoOutcome`] per URL in a [`BatchReport`].
//! - [`fix::auto_fix`]: repair a package already on disk.
//! - [`scan::check_extensions`] and [`registration::refresh_extensions`]:
//!   maintenance over everything in the clone root.
//!
//! # Example
//!
//! ```no_run
//! use clonebuddy_provision::{LogSink, WorkflowConfig, workflow};
//!
//! let config = WorkflowConfig::default();
//! let mut log = LogSink::new(&config.log_tag);
//! let outcome = workflow::run_single(&config, "https://github.com/org/tool", &mut log)?;
//! println!("{}: {}", outcome.url, outcome.status);
//! # Ok::<(), clonebuddy_provision::ProvisionError>(())
//! ```
//!
//! All settings come from one [`WorkflowConfig`]; nothing reads global state
//! except tool lookup, which falls back to `PATH`.

pub mod clone;
pub mod command;
pub mod config;
pub mod error;
pub mod fix;
pub mod log;
pub mod process;
pub mod registration;
pub mod report;
pub mod scan;
pub mod workflow;

#[cfg(all(test, unix))]
mod testutil;

pub use command::{SearchPath, is_command_available};
pub use config::{RegistrationCommand, WorkflowConfig};
pub use error::{ProvisionError, Result};
pub use fix::{FixAction, FixReport, auto_fix};
pub use log::LogSink;
pub use report::{BatchReport, RepoOutcome, RepoStatus};
