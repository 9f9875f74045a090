//! # Log Router
//!
//! `LogRouter` fans one leveled call out to every attached destination whose
//! threshold admits it. It owns the destinations, the step/substep counters
//! and the per-phase terminal thresholds.
//!
//! ## Counters
//!
//! `step` increments the step counter and resets the substep counter;
//! `substep` only increments the substep counter. Counters advance even when
//! the call itself produces no record (disabled, or no message parts), and
//! are never reset for the lifetime of the router. A substep issued before
//! any step is tagged ` 0.N`.
//!
//! ## Concurrency
//!
//! State sits behind a single mutex, so each call formats and writes to all
//! destinations before the next one starts. The router performs no
//! buffering beyond one record and spawns nothing.

use crate::destination::{ColorMode, Destination, FileRole, Role};
use crate::error::Result;
use crate::format::{FormatTemplate, Record};
use crate::level::{LevelRegistry, Severity};
use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Write as _};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Build a heterogeneous list of message parts for the leveled API.
///
/// ```rust
/// use test_logger::{parts, LogRouter};
///
/// let log = LogRouter::new("doc");
/// log.info(parts!["answer:", 42]);
/// ```
#[macro_export]
macro_rules! parts {
    ($($part:expr),* $(,)?) => {
        &[$(&$part as &dyn ::std::fmt::Display),*]
    };
}

/// Stage of a test's execution; selects the terminal threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configuration,
    Setup,
    Call,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Configuration => write!(f, "configuration"),
            Phase::Setup => write!(f, "setup"),
            Phase::Call => write!(f, "call"),
        }
    }
}

/// Terminal thresholds (ranks) for each phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseThresholds {
    pub configuration: u8,
    pub setup: u8,
    pub call: u8,
}

impl PhaseThresholds {
    pub fn for_phase(&self, phase: Phase) -> u8 {
        match phase {
            Phase::Configuration => self.configuration,
            Phase::Setup => self.setup,
            Phase::Call => self.call,
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        let info = Severity::Info.rank();
        Self {
            configuration: info,
            setup: info,
            call: info,
        }
    }
}

/// Per-call options: how parts are joined, whether to log at all, and extra
/// fields available to format templates.
#[derive(Clone, Debug)]
pub struct LogOptions {
    pub separator: String,
    pub terminator: String,
    pub enabled: bool,
    pub extra: BTreeMap<String, String>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            terminator: String::new(),
            enabled: true,
            extra: BTreeMap::new(),
        }
    }
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Conditional logging: a disabled call produces no record.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add an extra field; `step` is reserved and ignored.
    pub fn field(mut self, key: impl Into<String>, value: impl Display) -> Self {
        let key = key.into();
        if key != "step" {
            self.extra.insert(key, value.to_string());
        }
        self
    }

    fn join(&self, parts: &[&dyn Display]) -> String {
        let mut message = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                message.push_str(&self.separator);
            }
            let _ = write!(message, "{}", part);
        }
        message.push_str(&self.terminator);
        message
    }
}

struct RouterState {
    destinations: BTreeMap<Role, Destination>,
    step: u32,
    substep: u32,
    thresholds: PhaseThresholds,
    reported_missing_terminal: bool,
}

impl RouterState {
    fn replace(&mut self, role: Role, destination: Destination) {
        if let Some(previous) = self.destinations.insert(role, destination) {
            close_destination(role, previous);
        }
    }
}

fn close_destination(role: Role, destination: Destination) {
    let path = destination.path().map(Path::to_path_buf);
    if let Err(e) = destination.close() {
        warn!("Failed to close {} destination {:?}: {}", role, path, e);
    }
}

/// Process-wide logging channel with per-destination filtering.
pub struct LogRouter {
    name: String,
    registry: &'static LevelRegistry,
    state: Mutex<RouterState>,
}

macro_rules! leveled {
    ($(#[$doc:meta])* $name:ident, $with:ident, $severity:expr) => {
        $(#[$doc])*
        pub fn $name(&self, parts: &[&dyn Display]) {
            self.emit($severity, parts, &LogOptions::default());
        }

        #[doc = concat!("[`Self::", stringify!($name), "`] with explicit options.")]
        pub fn $with(&self, parts: &[&dyn Display], options: &LogOptions) {
            self.emit($severity, parts, options);
        }
    };
}

impl LogRouter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: LevelRegistry::global(),
            state: Mutex::new(RouterState {
                destinations: BTreeMap::new(),
                step: 0,
                substep: 0,
                thresholds: PhaseThresholds::default(),
                reported_missing_terminal: false,
            }),
        }
    }

    /// The process-global router, created on first use.
    pub fn global() -> &'static LogRouter {
        static ROUTER: OnceLock<LogRouter> = OnceLock::new();
        ROUTER.get_or_init(|| LogRouter::new(crate::defaults::ROUTER_NAME))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &'static LevelRegistry {
        self.registry
    }

    // ----- destination management -----

    /// Attach (or replace) the terminal destination on stdout.
    pub fn attach_terminal(&self, threshold: u8, template: &str) -> Result<()> {
        self.attach_terminal_writer(
            Box::new(std::io::stdout()),
            threshold,
            template,
            ColorMode::Auto,
        )
    }

    /// Attach (or replace) the terminal destination on an arbitrary writer.
    pub fn attach_terminal_writer(
        &self,
        writer: Box<dyn Write + Send>,
        threshold: u8,
        template: &str,
        color: ColorMode,
    ) -> Result<()> {
        let template = FormatTemplate::parse(template)?;
        let destination = Destination::console(writer, threshold, template, color);

        self.state.lock().replace(Role::Terminal, destination);
        debug!(
            "[{}] terminal destination attached (threshold {})",
            self.name, threshold
        );
        Ok(())
    }

    /// Attach (or replace) a file destination, creating parent directories.
    pub fn attach_file(
        &self,
        role: FileRole,
        path: impl AsRef<Path>,
        threshold: u8,
        template: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let template = FormatTemplate::parse(template)?;
        let destination = Destination::file(path, threshold, template)?;

        self.state.lock().replace(role.into(), destination);
        debug!(
            "[{}] {} destination attached at {:?} (threshold {})",
            self.name,
            Role::from(role),
            path,
            threshold
        );
        Ok(())
    }

    /// Change the terminal threshold. Without a terminal this is a no-op,
    /// reported once per router through diagnostics.
    pub fn set_terminal_threshold(&self, rank: u8) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(terminal) = state.destinations.get_mut(&Role::Terminal) {
            terminal.set_minimum_rank(rank);
            debug!("[{}] terminal threshold set to {}", self.name, rank);
        } else if !state.reported_missing_terminal {
            state.reported_missing_terminal = true;
            warn!(
                "[{}] terminal threshold change to {} ignored: no terminal destination attached",
                self.name, rank
            );
        }
    }

    pub fn terminal_threshold(&self) -> Option<u8> {
        self.state
            .lock()
            .destinations
            .get(&Role::Terminal)
            .map(Destination::minimum_rank)
    }

    /// Remove the destination under `role`, flushing and closing it.
    /// Returns whether anything was attached.
    pub fn detach(&self, role: Role) -> bool {
        let removed = self.state.lock().destinations.remove(&role);
        match removed {
            Some(destination) => {
                close_destination(role, destination);
                debug!("[{}] {} destination detached", self.name, role);
                true
            }
            None => false,
        }
    }

    /// Detach every destination.
    pub fn detach_all(&self) {
        let destinations = std::mem::take(&mut self.state.lock().destinations);
        for (role, destination) in destinations {
            close_destination(role, destination);
        }
        debug!("[{}] all destinations detached", self.name);
    }

    pub fn is_attached(&self, role: Role) -> bool {
        self.state.lock().destinations.contains_key(&role)
    }

    pub fn attached_roles(&self) -> Vec<Role> {
        self.state.lock().destinations.keys().copied().collect()
    }

    /// Path of the file destination under `role`.
    pub fn destination_path(&self, role: Role) -> Option<PathBuf> {
        self.state
            .lock()
            .destinations
            .get(&role)
            .and_then(|d| d.path().map(Path::to_path_buf))
    }

    // ----- phases -----

    pub fn phase_thresholds(&self) -> PhaseThresholds {
        self.state.lock().thresholds
    }

    pub fn set_phase_thresholds(&self, thresholds: PhaseThresholds) {
        self.state.lock().thresholds = thresholds;
    }

    /// Apply the terminal threshold configured for `phase`.
    pub fn enter_phase(&self, phase: Phase) {
        let rank = self.phase_thresholds().for_phase(phase);
        debug!("[{}] entering {} phase", self.name, phase);
        self.set_terminal_threshold(rank);
    }

    // ----- counters -----

    pub fn step_count(&self) -> u32 {
        self.state.lock().step
    }

    pub fn substep_count(&self) -> u32 {
        self.state.lock().substep
    }

    // ----- leveled API -----

    /// Log at a level given by name. Unknown names fail before anything is
    /// written or any counter moves.
    pub fn log(&self, level: &str, parts: &[&dyn Display], options: &LogOptions) -> Result<()> {
        let severity: Severity = self.registry.lookup(level)?.name.parse()?;
        self.emit(severity, parts, options);
        Ok(())
    }

    leveled!(debug, debug_with, Severity::Debug);
    leveled!(info, info_with, Severity::Info);
    leveled!(warning, warning_with, Severity::Warning);
    leveled!(error, error_with, Severity::Error);
    leveled!(critical, critical_with, Severity::Critical);
    leveled!(
        /// Log at the `pass` level.
        passed,
        passed_with,
        Severity::Pass
    );
    leveled!(fail, fail_with, Severity::Fail);
    leveled!(
        /// Start a new numbered step, tagged ` N`.
        step,
        step_with,
        Severity::Step
    );
    leveled!(
        /// Log a substep of the current step, tagged ` N.M` and indented on the terminal.
        substep,
        substep_with,
        Severity::Substep
    );

    fn emit(&self, severity: Severity, parts: &[&dyn Display], options: &LogOptions) {
        // Parts may log through this router from their Display impls, so the
        // message is rendered before the (non re-entrant) lock is taken.
        let message = (options.enabled && !parts.is_empty()).then(|| options.join(parts));

        let mut state = self.state.lock();

        let step = match severity {
            Severity::Step => {
                state.step += 1;
                state.substep = 0;
                format!(" {}", state.step)
            }
            Severity::Substep => {
                state.substep += 1;
                format!(" {}.{}", state.step, state.substep)
            }
            _ => String::new(),
        };

        let Some(message) = message else {
            return;
        };

        let record = Record {
            timestamp: Local::now(),
            rank: severity.rank(),
            level: severity.display_name(),
            step,
            message,
            extra: options.extra.clone(),
        };

        for (role, destination) in state.destinations.iter_mut() {
            if !destination.accepts(record.rank) {
                continue;
            }
            if let Err(e) = destination.write_record(&record, self.registry) {
                warn!("[{}] failed to write to {} destination: {}", self.name, role, e);
            }
        }
    }
}

impl std::fmt::Debug for LogRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LogRouter")
            .field("name", &self.name)
            .field("destinations", &state.destinations)
            .field("step", &state.step)
            .field("substep", &state.substep)
            .field("thresholds", &state.thresholds)
            .finish()
    }
}
