//! Output destinations owned by the router.

use crate::error::{LoggerError, Result};
use crate::format::{render_terminal, FormatTemplate, Record};
use crate::level::LevelRegistry;
use clap::ValueEnum;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Slot a destination occupies on the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Terminal,
    Setup,
    Call,
}

/// The roles a file destination may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Setup,
    Call,
}

impl FileRole {
    /// Suffix used in per-test report file names.
    pub fn phase_name(self) -> &'static str {
        match self {
            FileRole::Setup => "setup",
            FileRole::Call => "call",
        }
    }
}

impl From<FileRole> for Role {
    fn from(role: FileRole) -> Self {
        match role {
            FileRole::Setup => Role::Setup,
            FileRole::Call => Role::Call,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Terminal => write!(f, "terminal"),
            Role::Setup => write!(f, "setup file"),
            Role::Call => write!(f, "call file"),
        }
    }
}

/// When the terminal destination emits ANSI colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour when stdout looks like a colour terminal
    #[default]
    Auto,
    /// Always colour
    Always,
    /// Never colour
    Never,
}

impl ColorMode {
    pub fn enabled(self) -> bool {
        match self {
            ColorMode::Auto => colored::control::SHOULD_COLORIZE.should_colorize(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// An in-memory writer whose clones share one buffer.
///
/// Useful as a terminal sink when the host captures output itself.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Written lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Sink {
    Console(Box<dyn Write + Send>),
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

/// A configured output: sink, threshold and layout.
pub struct Destination {
    sink: Sink,
    minimum_rank: u8,
    template: FormatTemplate,
    color: ColorMode,
}

impl Destination {
    /// A console destination writing to `writer`.
    pub fn console(
        writer: Box<dyn Write + Send>,
        minimum_rank: u8,
        template: FormatTemplate,
        color: ColorMode,
    ) -> Self {
        Self {
            sink: Sink::Console(writer),
            minimum_rank,
            template,
            color,
        }
    }

    /// Open `path` for append, creating missing parent directories first.
    pub fn file(path: &Path, minimum_rank: u8, template: FormatTemplate) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(LoggerError::EmptyPath);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LoggerError::PathCreation {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggerError::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            sink: Sink::File {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
            },
            minimum_rank,
            template,
            color: ColorMode::Never,
        })
    }

    pub fn minimum_rank(&self) -> u8 {
        self.minimum_rank
    }

    pub fn set_minimum_rank(&mut self, rank: u8) {
        self.minimum_rank = rank;
    }

    pub fn template(&self) -> &FormatTemplate {
        &self.template
    }

    /// File path, for file destinations.
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File { path, .. } => Some(path),
            Sink::Console(_) => None,
        }
    }

    pub fn accepts(&self, rank: u8) -> bool {
        rank >= self.minimum_rank
    }

    /// Render and write one record, flushing so every record reaches the
    /// sink before the log call returns.
    pub fn write_record(&mut self, record: &Record, registry: &LevelRegistry) -> io::Result<()> {
        match &mut self.sink {
            Sink::Console(writer) => {
                let line =
                    render_terminal(&self.template, record, registry, self.color.enabled());
                writeln!(writer, "{}", line)?;
                writer.flush()
            }
            Sink::File { writer, .. } => {
                writeln!(writer, "{}", self.template.render(record))?;
                writer.flush()
            }
        }
    }

    /// Flush and release the sink.
    pub fn close(mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Console(writer) => writer.flush(),
            Sink::File { writer, .. } => {
                writer.flush()?;
                writer.get_ref().sync_all()
            }
        }
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sink = match &self.sink {
            Sink::Console(_) => "console".to_string(),
            Sink::File { path, .. } => path.display().to_string(),
        };
        f.debug_struct("Destination")
            .field("sink", &sink)
            .field("minimum_rank", &self.minimum_rank)
            .field("template", &self.template.as_str())
            .field("color", &self.color)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use chrono::Local;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(level: Severity, message: &str) -> Record {
        Record {
            timestamp: Local::now(),
            rank: level.rank(),
            level: level.display_name(),
            step: String::new(),
            message: message.to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_file_destination_creates_parents_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/test_a_setup.log");
        let template = FormatTemplate::parse("{level} {message}").unwrap();

        let mut dest = Destination::file(&path, Severity::Info.rank(), template.clone()).unwrap();
        dest.write_record(&record(Severity::Info, "first"), LevelRegistry::global())
            .unwrap();
        dest.close().unwrap();

        let mut dest = Destination::file(&path, Severity::Info.rank(), template).unwrap();
        dest.write_record(&record(Severity::Warning, "second"), LevelRegistry::global())
            .unwrap();
        dest.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "INFO first\nWARNING second\n");
    }

    #[test]
    fn test_empty_path_rejected() {
        let template = FormatTemplate::parse("{message}").unwrap();
        assert!(matches!(
            Destination::file(Path::new(""), 20, template),
            Err(LoggerError::EmptyPath)
        ));
    }

    #[test]
    fn test_path_creation_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let template = FormatTemplate::parse("{message}").unwrap();
        let err = Destination::file(&blocker.join("sub/x.log"), 20, template).unwrap_err();
        assert!(matches!(err, LoggerError::PathCreation { .. }));
    }

    #[test]
    fn test_file_open_error() {
        let dir = TempDir::new().unwrap();
        let template = FormatTemplate::parse("{message}").unwrap();
        // A directory cannot be opened as a log file.
        let err = Destination::file(dir.path(), 20, template).unwrap_err();
        assert!(matches!(err, LoggerError::FileOpen { .. }));
    }

    #[test]
    fn test_console_destination_threshold() {
        let sink = MemorySink::new();
        let dest = Destination::console(
            Box::new(sink.clone()),
            Severity::Warning.rank(),
            FormatTemplate::parse("{message}").unwrap(),
            ColorMode::Never,
        );
        assert!(!dest.accepts(Severity::Info.rank()));
        assert!(!dest.accepts(Severity::Pass.rank()));
        assert!(dest.accepts(Severity::Warning.rank()));
        assert!(dest.accepts(Severity::Fail.rank()));
    }

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writeln!(writer, "one").unwrap();
        writeln!(writer, "two").unwrap();
        assert_eq!(sink.lines(), vec!["one", "two"]);
        sink.clear();
        assert!(sink.contents().is_empty());
    }
}
