//! # Test Logger
//!
//! A colorized, leveled log router for test runners. One log call fans out to
//! the terminal and to per-test log files, each with its own minimum level and
//! record layout, and step/substep calls number themselves as a test proceeds.
//!
//! ## Architecture Overview
//!
//! - `level`: the nine severities and the validated rank↔name registry
//! - `format`: record templates and terminal colouring
//! - `destination`: terminal and file sinks with per-destination thresholds
//! - `router`: the shared `LogRouter` with the leveled API and counters
//! - `lifecycle`: `PhaseDriver`, the hooks a host runner calls per phase
//! - `cli`: command-line and JSON configuration of thresholds and layouts
//! - `logging`: `tracing` diagnostics for the logger's own housekeeping
//! - `utils`: report-file naming and lenient level-name mapping
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use test_logger::{log, parts, LoggerConfig, PhaseDriver};
//!
//! fn main() -> anyhow::Result<()> {
//!     let driver = PhaseDriver::global(LoggerConfig::default());
//!     driver.on_process_configure()?;
//!
//!     driver.on_test_setup_begin("test_hello")?;
//!     log().info(parts!["This is info from the setup"]);
//!
//!     driver.on_test_call_begin("test_hello")?;
//!     log().step(parts!["open the door"]);
//!     log().substep(parts!["turn the handle"]);
//!     log().passed(parts!["door is open"]);
//!     driver.on_test_finish("test_hello");
//!
//!     driver.on_process_unconfigure();
//!     Ok(())
//! }
//! ```

/// Command-line and file configuration
///
/// `LoggerArgs` can be flattened into a host runner's clap parser;
/// `LoggerConfig` is the resolved form consumed by the lifecycle driver.
pub mod cli;

pub mod destination;

/// Error taxonomy shared by every module
pub mod error;

pub mod format;

pub mod level;

/// Phase hooks for host test runners
pub mod lifecycle;

pub mod logging;

/// The shared router and the leveled logging API
pub mod router;

pub mod utils;

pub use cli::{LoggerArgs, LoggerConfig, ThresholdLevel};
pub use destination::{ColorMode, FileRole, MemorySink, Role};
pub use error::{LoggerError, Result};
pub use level::{LevelRegistry, LevelSpec, Severity};
pub use lifecycle::PhaseDriver;
pub use router::{LogOptions, LogRouter, Phase, PhaseThresholds};

/// The process-global router.
pub fn log() -> &'static LogRouter {
    LogRouter::global()
}

/// The current version of the test logger
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Name of the process-global router.
    pub const ROUTER_NAME: &str = "test_logger";

    /// Directory receiving per-test log files, relative to the working directory.
    pub const REPORTS_DIR: &str = "./reports";

    /// Terminal record layout.
    pub const TERM_FORMAT: &str = "[{timestamp}] [{level}{step}] - {message}";

    /// Per-test file record layout.
    pub const FILE_FORMAT: &str = "[{timestamp}] [{level}{step}] - {message}";

    /// Diagnostics filter used when `RUST_LOG` is unset.
    pub const DIAGNOSTICS_DIRECTIVE: &str = "test_logger=warn";
}
