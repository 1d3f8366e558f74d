//! End-to-end workflow runs against stub `git` and `pyrevit` executables.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use clonebuddy_core::{ExtensionPackage, ValidationRules, validate_structure};
use clonebuddy_provision::{LogSink, RepoStatus, WorkflowConfig, registration, scan, workflow};

fn write_script(dir: &Path, name: &str, body: &str) {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Stub tools in `<tmp>/bin`.
///
/// `git clone` creates a bare-bones checkout unless the URL mentions
/// "private". `pyrevit env` prints every path passed to `extensions add`
/// so far, which makes registration stick between calls.
fn setup(tmp: &Path) -> (WorkflowConfig, PathBuf) {
    let bin = tmp.join("bin");
    let state = tmp.join("registered.txt");
    fs::write(&state, "").unwrap();

    write_script(
        &bin,
        "git",
        "case \"$2\" in\n\
         *private*) echo 'remote: Repository not found.' >&2; exit 128;;\n\
         esac\n\
         mkdir -p \"$3/lib\" && echo 'def helper(): pass' > \"$3/lib/helper.py\"",
    );
    write_script(
        &bin,
        "pyrevit",
        &format!(
            "case \"$1\" in\n\
             env) cat '{state}';;\n\
             extensions) echo \"$4\" >> '{state}';;\n\
             esac\n\
             exit 0",
            state = state.display()
        ),
    );

    let config = WorkflowConfig::default()
        .with_clone_root(tmp.join("clones"))
        .with_search_path(bin.as_os_str());
    (config, state)
}

#[test]
fn test_batch_processes_every_url() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut config, state) = setup(tmp.path());
    config.batch_log_file = Some(tmp.path().join("logs").join("batch.txt"));

    let urls = vec![
        "https://github.com/org/first.git".to_string(),
        "https://github.com/org/private-tool".to_string(),
        "https://github.com/org/third/".to_string(),
    ];

    let mut log = workflow::open_batch_log(&config);
    let report = workflow::run_batch(&config, &urls, &mut log).unwrap();
    let log_path = log.finish().unwrap().unwrap();

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            RepoStatus::Registered,
            RepoStatus::CloneFailed,
            RepoStatus::Registered
        ]
    );

    for name in ["first.extension", "third.extension"] {
        let path = config.clone_root.join(name);
        assert!(validate_structure(&path, ValidationRules::strict()).is_empty());
        assert!(path.join("lib").join("helper.py").is_file());
    }
    assert!(!config.clone_root.join("private-tool.extension").exists());

    let registered = fs::read_to_string(&state).unwrap();
    assert_eq!(registered.lines().count(), 2);

    let logged = fs::read_to_string(&log_path).unwrap();
    assert!(logged.contains("[BatchCloneBuddy] Processing: https://github.com/org/private-tool"));
    assert!(logged.contains("Repository not found"));
    assert!(logged.contains("Batch complete: 2/3"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["outcomes"][1]["status"], "clone_failed");
}

#[test]
fn test_second_batch_run_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut config, state) = setup(tmp.path());
    config.batch_log_file = None;
    let urls = ["https://github.com/org/again"];

    let mut log = LogSink::silent("Batch");
    workflow::run_batch(&config, &urls, &mut log).unwrap();
    let manifest = ExtensionPackage::new(config.clone_root.join("again.extension")).manifest_path();
    let before = fs::read(&manifest).unwrap();

    let mut log = LogSink::silent("Batch");
    let report = workflow::run_batch(&config, &urls, &mut log).unwrap();
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, RepoStatus::Registered);
    assert!(outcome.issues_before.is_empty());
    assert!(outcome.fixes.is_empty());
    assert!(log.lines().iter().any(|line| line.contains("Skipping clone")));
    assert!(log.lines().iter().any(|line| line.contains("already registered")));

    assert_eq!(fs::read(&manifest).unwrap(), before);
    assert_eq!(fs::read_to_string(&state).unwrap().lines().count(), 1);
}

#[test]
fn test_check_and_refresh_after_manual_clone() {
    let tmp = tempfile::tempdir().unwrap();
    let (config, state) = setup(tmp.path());

    let manual = config.clone_root.join("Manual.extension");
    let button = manual.join("Tools.tab").join("Main.panel").join("Run.pushbutton");
    fs::create_dir_all(&button).unwrap();
    fs::write(button.join("script.py"), "print('run')\n").unwrap();
    fs::write(manual.join("extension.json"), r#"{"name": "Manual"}"#).unwrap();

    let mut log = LogSink::silent("CloneBuddy");
    let entries = scan::check_extensions(&config, &mut log).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_valid());
    assert!(!entries[0].loaded);

    // `extend extensions <path>` puts the path in $3, which this stub
    // ignores, so the state file stays empty and only the call matters.
    let report = registration::refresh_extensions(&config, &mut log).unwrap();
    assert_eq!(report.registered, vec![manual]);
    assert!(report.reloaded);
    assert_eq!(fs::read_to_string(&state).unwrap(), "");
}
