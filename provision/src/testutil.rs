//! Fake external tools for subprocess tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script named `name` into `dir`.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Host CLI stub: `env` prints `report`, every call is appended to
/// `<dir>/calls.txt`.
pub fn fake_host(dir: &Path, report: &str) -> PathBuf {
    let calls = dir.join("calls.txt");
    let body = format!(
        "echo \"$*\" >> '{}'\nif [ \"$1\" = env ]; then\ncat <<'EOF'\n{report}\nEOF\nfi\nexit 0",
        calls.display()
    );
    fake_tool(dir, "pyrevit", &body)
}

/// Calls recorded by [`fake_host`], one per line.
pub fn host_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
