//! User-facing workflow log.
//!
//! Every line goes to the console with a `[Tag] ` prefix and, when a file is
//! attached, is appended to that file as well. Diagnostics that are not
//! meant for the user go through `tracing` instead.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Tagged console log with an optional append-mode file copy.
///
/// The file is opened when attached and closed when the sink is dropped or
/// [`finish`](Self::finish)ed, whichever comes first. Only silent sinks keep
/// the logged lines in memory.
#[derive(Debug)]
pub struct LogSink {
    tag: String,
    echo: bool,
    file: Option<(PathBuf, File)>,
    lines: Vec<String>,
}

impl LogSink {
    /// Sink that prints to stdout.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            echo: true,
            file: None,
            lines: Vec::new(),
        }
    }

    /// Sink that records lines in memory instead of printing them (the file,
    /// if attached, still receives every line).
    pub fn silent(tag: impl Into<String>) -> Self {
        Self {
            echo: false,
            ..Self::new(tag)
        }
    }

    /// Attaches an append-mode file, creating parent directories.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.file = Some((path.to_path_buf(), file));
        Ok(self)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    /// Lines logged so far, already tagged. Always empty for echoing sinks.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Logs one message.
    pub fn line(&mut self, message: impl AsRef<str>) {
        for part in message.as_ref().split('\n') {
            let tagged = format!("[{}] {}", self.tag, part);
            self.append_to_file(&tagged);
            if self.echo {
                println!("{tagged}");
            } else {
                self.lines.push(tagged);
            }
        }
    }

    fn append_to_file(&mut self, tagged: &str) {
        let Some((path, file)) = self.file.as_mut() else {
            return;
        };

        if writeln!(file, "{tagged}").is_ok() {
            return;
        }

        let stripped = strip_symbols(tagged);
        if let Err(err) = writeln!(file, "{stripped}") {
            warn!(path = %path.display(), error = %err, "Disabling log file after write failure");
            self.file = None;
        }
    }

    /// Flushes and closes the file, returning its path if one was attached.
    pub fn finish(mut self) -> io::Result<Option<PathBuf>> {
        match self.file.take() {
            Some((path, mut file)) => {
                file.flush()?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

/// Removes characters outside the Basic Multilingual Plane (emoji and
/// other pictographs) from `text`.
pub fn strip_symbols(text: &str) -> String {
    static SUPPLEMENTARY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[\x{10000}-\x{10FFFF}]").expect("static regex must compile")
    });
    SUPPLEMENTARY_RE.replace_all(text, "").into_owned()
}
