//! Blocking invocation of external tools with captured output.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// Trimmed stderr, or a generic message when the tool printed nothing.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if self.timed_out {
            "timed out".to_string()
        } else if !stderr.is_empty() {
            stderr.to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("Unknown error (exit code {code})"),
                None => "Unknown error".to_string(),
            }
        }
    }
}

/// Runs `program` with `args`, stdin closed and output captured.
///
/// When `timeout` elapses the child is killed and the output is marked
/// `timed_out`. Launch failures are returned as `Err`.
pub fn run_tool<I, S>(
    program: &Path,
    args: I,
    env: &[(&str, &str)],
    timeout: Option<Duration>,
) -> std::io::Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        command.env(key, value);
    }

    debug!(program = %program.display(), "Spawning tool");
    let mut child = command.spawn()?;

    // Drain both pipes off-thread so a chatty child cannot fill a pipe
    // buffer and block before it exits.
    let stdout_thread = child.stdout.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_thread = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = match timeout {
        Some(limit) => child.wait_timeout(limit)?,
        None => Some(child.wait()?),
    };

    let mut output = ToolOutput::default();
    match status {
        Some(status) => {
            output.exit_code = status.code();
            output.success = status.success();
        }
        None => {
            debug!(
                program = %program.display(),
                timeout_secs = timeout.map(|t| t.as_secs()).unwrap_or_default(),
                "Tool timed out, killing process"
            );
            output.timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    let collect = |handle: Option<std::thread::JoinHandle<Vec<u8>>>| {
        handle
            .and_then(|thread| thread.join().ok())
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    };
    output.stdout = collect(stdout_thread);
    output.stderr = collect(stderr_thread);

    debug!(
        program = %program.display(),
        exit_code = ?output.exit_code,
        timed_out = output.timed_out,
        "Tool finished"
    );
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_exit_code() {
        let output = run_tool(Path::new("/bin/sh"), ["-c", "echo hello; exit 3"], &[], None).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success);
        assert_eq!(output.failure_detail(), "Unknown error (exit code 3)");
    }

    #[test]
    fn test_failure_detail_prefers_stderr() {
        let output = run_tool(
            Path::new("/bin/sh"),
            ["-c", "echo 'fatal: repository not found' >&2; exit 128"],
            &[],
            None,
        )
        .unwrap();
        assert_eq!(output.failure_detail(), "fatal: repository not found");
        assert!(output.combined().contains("repository not found"));
    }

    #[test]
    fn test_env_overrides_are_passed() {
        let output = run_tool(
            Path::new("/bin/sh"),
            ["-c", "printf %s \"$CLONEBUDDY_MARKER\""],
            &[("CLONEBUDDY_MARKER", "on")],
            None,
        )
        .unwrap();
        assert_eq!(output.stdout, "on");
    }

    #[test]
    fn test_timeout_kills_child() {
        let output = run_tool(
            Path::new("/bin/sh"),
            ["-c", "exec sleep 5"],
            &[],
            Some(Duration::from_millis(100)),
        )
        .unwrap();
        assert!(output.timed_out);
        assert!(!output.success);
        assert_eq!(output.failure_detail(), "timed out");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let result = run_tool(Path::new("/nonexistent/clonebuddy-tool"), ["x"], &[], None);
        assert!(result.is_err());
    }
}
