//! # Test Lifecycle Hooks
//!
//! `PhaseDriver` is what a host test runner calls at its lifecycle points.
//! It turns phase changes into router operations:
//!
//! 1. **configure**: attach the terminal with the configuration-phase threshold
//! 2. **setup begin**: close any call file left by the previous test, switch
//!    the terminal to the setup threshold, open `{reports_dir}/{test}_setup.log`
//! 3. **call begin**: switch the terminal to the call threshold, close the
//!    setup file, open `{reports_dir}/{test}_call.log`
//! 4. **finish**: close the call file
//! 5. **unconfigure**: close everything
//!
//! File-system failures are returned to the host, which should treat them
//! as configuration errors rather than test failures.

use crate::cli::LoggerConfig;
use crate::destination::{FileRole, Role};
use crate::error::Result;
use crate::router::{LogRouter, Phase};
use crate::utils::report_path;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Drives a `LogRouter` through the phases of a test run.
pub struct PhaseDriver<'a> {
    router: &'a LogRouter,
    config: LoggerConfig,
}

impl<'a> PhaseDriver<'a> {
    pub fn new(router: &'a LogRouter, config: LoggerConfig) -> Self {
        router.set_phase_thresholds(config.phase_thresholds());
        Self { router, config }
    }

    /// Driver bound to the process-global router.
    pub fn global(config: LoggerConfig) -> PhaseDriver<'static> {
        PhaseDriver::new(LogRouter::global(), config)
    }

    pub fn router(&self) -> &'a LogRouter {
        self.router
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Replace the configuration; thresholds apply from the next phase change.
    pub fn set_config(&mut self, config: LoggerConfig) {
        self.router.set_phase_thresholds(config.phase_thresholds());
        self.config = config;
    }

    /// Attach the terminal destination on stdout.
    pub fn on_process_configure(&self) -> Result<()> {
        self.on_process_configure_with(Box::new(std::io::stdout()))
    }

    /// Attach the terminal destination on a caller-supplied writer.
    pub fn on_process_configure_with(&self, writer: Box<dyn Write + Send>) -> Result<()> {
        self.router.attach_terminal_writer(
            writer,
            self.config.term_config_loglevel.rank(),
            &self.config.term_format,
            self.config.color,
        )?;
        info!(
            "Logger configured: terminal {}/{}/{}, reports in {:?}",
            self.config.term_config_loglevel,
            self.config.term_setup_loglevel,
            self.config.term_call_loglevel,
            self.config.reports_dir
        );
        Ok(())
    }

    /// Also closes the previous test's call file, for hosts that never call
    /// `on_test_finish`.
    pub fn on_test_setup_begin(&self, test_identity: &str) -> Result<PathBuf> {
        self.router.detach(Role::Call);
        self.router.enter_phase(Phase::Setup);
        self.open_phase_file(FileRole::Setup, test_identity)
    }

    pub fn on_test_call_begin(&self, test_identity: &str) -> Result<PathBuf> {
        self.router.enter_phase(Phase::Call);
        self.router.detach(Role::Setup);
        self.open_phase_file(FileRole::Call, test_identity)
    }

    pub fn on_test_finish(&self, test_identity: &str) {
        self.router.detach(Role::Setup);
        self.router.detach(Role::Call);
        debug!("Finished logging for {}", test_identity);
    }

    pub fn on_process_unconfigure(&self) {
        self.router.detach_all();
    }

    fn open_phase_file(&self, role: FileRole, test_identity: &str) -> Result<PathBuf> {
        let path = report_path(&self.config.reports_dir, test_identity, role.phase_name());
        let threshold = match role {
            FileRole::Setup => self.config.setup_file_loglevel.rank(),
            FileRole::Call => self.config.call_file_loglevel.rank(),
        };
        self.router
            .attach_file(role, &path, threshold, &self.config.file_format)?;
        Ok(path)
    }
}
