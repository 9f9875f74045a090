use crate::destination::ColorMode;
use crate::level::Severity;
use crate::router::PhaseThresholds;
use crate::utils::map_level_name;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging options a host test runner exposes on its command line
#[derive(Args, Debug, Clone, Default)]
pub struct LoggerArgs {
    /// Defines the log level for the terminal logs at config time.
    #[clap(long, value_enum, ignore_case = true, help_heading = "Logging Options")]
    pub term_config_loglevel: Option<ThresholdLevel>,

    /// Defines the log level for the terminal logs at setup time.
    #[clap(long, value_enum, ignore_case = true, help_heading = "Logging Options")]
    pub term_setup_loglevel: Option<ThresholdLevel>,

    /// Defines the log level for the terminal logs at call time.
    #[clap(long, value_enum, ignore_case = true, help_heading = "Logging Options")]
    pub term_call_loglevel: Option<ThresholdLevel>,

    /// Minimum level written to the per-test setup log file.
    #[clap(long, value_enum, ignore_case = true, help_heading = "Logging Options")]
    pub setup_file_loglevel: Option<ThresholdLevel>,

    /// Minimum level written to the per-test call log file.
    #[clap(long, value_enum, ignore_case = true, help_heading = "Logging Options")]
    pub call_file_loglevel: Option<ThresholdLevel>,

    /// Record layout for the terminal, e.g. "[{timestamp}] [{level}{step}] - {message}"
    #[clap(long, help_heading = "Logging Options")]
    pub log_term_format: Option<String>,

    /// Record layout for the per-test log files
    #[clap(long, help_heading = "Logging Options")]
    pub log_file_format: Option<String>,

    /// Directory receiving the per-test log files
    #[clap(long, help_heading = "Logging Options")]
    pub reports_dir: Option<PathBuf>,

    /// When to colour terminal output
    #[clap(long, value_enum, help_heading = "Logging Options")]
    pub color: Option<ColorMode>,

    /// JSON file with logger settings; command-line flags take precedence
    #[clap(long = "logger-config", help_heading = "Logging Options")]
    pub config: Option<PathBuf>,
}

/// Levels selectable as thresholds. The test-reporting levels (step,
/// substep, pass, fail) are message severities only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThresholdLevel {
    #[clap(name = "DEBUG")]
    Debug,
    #[default]
    #[clap(name = "INFO")]
    Info,
    #[clap(name = "WARNING")]
    Warning,
    #[clap(name = "ERROR")]
    Error,
    #[clap(name = "CRITICAL")]
    Critical,
}

impl ThresholdLevel {
    pub fn severity(self) -> Severity {
        match self {
            ThresholdLevel::Debug => Severity::Debug,
            ThresholdLevel::Info => Severity::Info,
            ThresholdLevel::Warning => Severity::Warning,
            ThresholdLevel::Error => Severity::Error,
            ThresholdLevel::Critical => Severity::Critical,
        }
    }

    pub fn rank(self) -> u8 {
        self.severity().rank()
    }

    /// Resolve free-form text such as "warn" or "Crit" through
    /// [`map_level_name`]. Test-reporting levels are not thresholds and
    /// resolve to INFO.
    pub fn from_lenient(name: &str) -> Self {
        match map_level_name(name) {
            Severity::Debug => ThresholdLevel::Debug,
            Severity::Warning => ThresholdLevel::Warning,
            Severity::Error => ThresholdLevel::Error,
            Severity::Critical => ThresholdLevel::Critical,
            _ => ThresholdLevel::Info,
        }
    }
}

/// Config files accept the same lenient spellings as the level mapping.
impl<'de> Deserialize<'de> for ThresholdLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(ThresholdLevel::from_lenient(&name))
    }
}

impl std::fmt::Display for ThresholdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.severity().display_name())
    }
}

/// Resolved logger settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub term_config_loglevel: ThresholdLevel,
    pub term_setup_loglevel: ThresholdLevel,
    pub term_call_loglevel: ThresholdLevel,
    pub setup_file_loglevel: ThresholdLevel,
    pub call_file_loglevel: ThresholdLevel,
    pub term_format: String,
    pub file_format: String,
    pub reports_dir: PathBuf,
    pub color: ColorMode,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            term_config_loglevel: ThresholdLevel::Info,
            term_setup_loglevel: ThresholdLevel::Info,
            term_call_loglevel: ThresholdLevel::Info,
            setup_file_loglevel: ThresholdLevel::Info,
            call_file_loglevel: ThresholdLevel::Info,
            term_format: crate::defaults::TERM_FORMAT.to_string(),
            file_format: crate::defaults::FILE_FORMAT.to_string(),
            reports_dir: PathBuf::from(crate::defaults::REPORTS_DIR),
            color: ColorMode::Auto,
        }
    }
}

impl LoggerConfig {
    /// Load settings from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read logger config {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse logger config {:?}", path))
    }

    /// Resolve command-line arguments, reading `--logger-config` first when given.
    pub fn from_args(args: &LoggerArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        Ok(base.merge(args))
    }

    /// Overlay explicitly given flags on top of `self`.
    pub fn merge(mut self, args: &LoggerArgs) -> Self {
        if let Some(level) = args.term_config_loglevel {
            self.term_config_loglevel = level;
        }
        if let Some(level) = args.term_setup_loglevel {
            self.term_setup_loglevel = level;
        }
        if let Some(level) = args.term_call_loglevel {
            self.term_call_loglevel = level;
        }
        if let Some(level) = args.setup_file_loglevel {
            self.setup_file_loglevel = level;
        }
        if let Some(level) = args.call_file_loglevel {
            self.call_file_loglevel = level;
        }
        if let Some(ref format) = args.log_term_format {
            self.term_format = format.clone();
        }
        if let Some(ref format) = args.log_file_format {
            self.file_format = format.clone();
        }
        if let Some(ref dir) = args.reports_dir {
            self.reports_dir = dir.clone();
        }
        if let Some(color) = args.color {
            self.color = color;
        }
        self
    }

    pub fn phase_thresholds(&self) -> PhaseThresholds {
        PhaseThresholds {
            configuration: self.term_config_loglevel.rank(),
            setup: self.term_setup_loglevel.rank(),
            call: self.term_call_loglevel.rank(),
        }
    }
}

impl From<&LoggerArgs> for LoggerConfig {
    fn from(args: &LoggerArgs) -> Self {
        LoggerConfig::default().merge(args)
    }
}
