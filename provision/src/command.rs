//! Executable lookup on a search path.
//!
//! Tools are resolved here and spawned by absolute path, so lookup behaves
//! the same on every platform instead of depending on shell semantics.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::PathBuf;

/// Ordered list of directories searched for executables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Directories listed in the `PATH` environment variable.
    pub fn from_env() -> Self {
        env::var_os("PATH")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// Splits a `PATH`-style list on the platform separator.
    ///
    /// Empty entries are dropped and surrounding double quotes removed.
    pub fn parse(value: &OsStr) -> Self {
        let dirs = env::split_paths(value)
            .filter_map(|dir| {
                let raw = dir.to_string_lossy();
                let unquoted = raw.trim().trim_matches('"');
                if unquoted.is_empty() {
                    None
                } else if unquoted.len() == raw.len() {
                    Some(dir)
                } else {
                    Some(PathBuf::from(unquoted))
                }
            })
            .collect();
        Self { dirs }
    }

    pub fn from_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Returns the first `<dir>/<name>` or `<dir>/<name>.exe` that is a
    /// regular file. Directories that cannot be read are skipped.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        if name.trim().is_empty() {
            return None;
        }

        let with_exe = format!("{name}.exe");
        for dir in &self.dirs {
            for candidate in [dir.join(name), dir.join(&with_exe)] {
                if fs::metadata(&candidate).is_ok_and(|meta| meta.is_file()) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl From<OsString> for SearchPath {
    fn from(value: OsString) -> Self {
        Self::parse(&value)
    }
}

/// Checks whether `name` is reachable through `PATH`.
pub fn is_command_available(name: &str) -> bool {
    SearchPath::from_env().contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_plain_and_exe_names() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("git"), "").unwrap();
        fs::write(tmp.path().join("pyrevit.exe"), "").unwrap();
        fs::create_dir(tmp.path().join("notatool")).unwrap();

        let search = SearchPath::from_dirs([tmp.path().join("missing"), tmp.path().to_path_buf()]);
        assert_eq!(search.find("git"), Some(tmp.path().join("git")));
        assert_eq!(search.find("pyrevit"), Some(tmp.path().join("pyrevit.exe")));
        assert!(!search.contains("notatool"));
        assert!(!search.contains(""));
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("tool"), "").unwrap();
        fs::write(second.path().join("tool"), "").unwrap();

        let search = SearchPath::from_dirs([first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(search.find("tool"), Some(first.path().join("tool")));
    }

    #[test]
    fn test_parse_strips_quotes_and_empty_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("tool"), "").unwrap();

        let joined = env::join_paths([tmp.path().to_path_buf(), PathBuf::new()]).unwrap();
        let search = SearchPath::parse(&joined);
        assert_eq!(search.dirs(), &[tmp.path().to_path_buf()]);
        assert!(search.contains("tool"));

        #[cfg(unix)]
        {
            let quoted = OsString::from(format!("\"{}\"", tmp.path().display()));
            assert!(SearchPath::parse(&quoted).contains("tool"));
        }
    }

    #[test]
    fn test_nonexistent_tool_is_unavailable() {
        assert!(!is_command_available("nonexistent-tool-xyz"));

        let tmp = tempfile::tempdir().unwrap();
        let search = SearchPath::from_dirs([tmp.path().to_path_buf()]);
        assert!(!search.contains("nonexistent-tool-xyz"));
    }
}
