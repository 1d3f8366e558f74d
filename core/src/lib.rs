//! Core package types and layout validation for CloneBuddy.
//!
//! A *package* is a directory whose name ends with `.extension`, that holds
//! an `extension.json` manifest at its root and at least one `.pushbutton`
//! folder containing a Python entry script. This crate models that layout
//! and checks directories against it:
//!
//! - [`RepositorySource`]: a remote URL and the folder name derived from it.
//! - [`ExtensionPackage`]: a package directory on disk.
//! - [`ExtensionManifest`] / [`ManifestTemplate`]: the typed manifest and
//!   the builder used to synthesize a default one.
//! - [`validate_structure`]: the ordered list of [`StructureIssue`]s found
//!   in a directory.
//!
//! Nothing here spawns processes or modifies the filesystem; cloning and
//! repair live in `clonebuddy-provision`.
//!
//! # Example
//!
//! ```
//! use clonebuddy_core::*;
//!
//! let source = RepositorySource::new("https://github.com/org/pyRevit-Search.git");
//! assert_eq!(source.extension_name(), "pyRevit-Search.extension");
//!
//! let package = ExtensionPackage::new("/nonexistent/pyRevit-Search.extension");
//! assert!(package.has_package_suffix());
//! assert_eq!(package.extension_name(), "pyRevit-Search");
//!
//! let issues = validate_structure(package.root_path(), ValidationRules::default());
//! assert_eq!(
//!     issues,
//!     vec![StructureIssue::MissingManifest, StructureIssue::MissingUiEntry]
//! );
//! ```

mod manifest;
mod package;
mod validate;

pub use manifest::{
    DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, ExtensionManifest, ManifestFlag, ManifestTemplate,
};
pub use package::{
    ENTRY_SCRIPT_EXTENSION, ExtensionPackage, MANIFEST_FILE_NAME, ManifestReadError,
    PACKAGE_SUFFIX, RepositorySource, UI_ENTRY_SUFFIX, named_path, strip_package_suffix,
    with_package_suffix,
};
pub use validate::{StructureIssue, ValidationRules, find_ui_entry, validate_structure};
