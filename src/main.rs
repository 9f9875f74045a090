//! # Test Logger - Demo Driver
//!
//! Runs a small simulated test session against the process-global router so
//! the terminal output and the per-test report files can be inspected:
//!
//! 1. **Initialize diagnostics**: logger housekeeping goes to stderr
//! 2. **Parse arguments**: logging options plus the test names to simulate
//! 3. **Configure**: attach the terminal destination
//! 4. **Run tests**: setup, call and finish hooks for each test
//! 5. **Unconfigure**: flush and close every destination
//!
//! Example: `test-logger --term-call-loglevel debug --tests test_hello test_door`

use anyhow::{Context, Result};
use clap::Parser;
use test_logger::{
    defaults, log, logging::init_diagnostics, parts, LogOptions, LoggerArgs, LoggerConfig,
    PhaseDriver,
};
use tracing::info;

/// Simulate a test session through the test logger
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    logger: LoggerArgs,

    /// Names of the tests to simulate
    #[clap(long, num_args = 1.., default_values_t = vec!["test_hello".to_string()])]
    tests: Vec<String>,

    /// Make the simulated call phase fail
    #[clap(long, default_value_t = false)]
    fail: bool,
}

fn main() -> Result<()> {
    init_diagnostics(defaults::DIAGNOSTICS_DIRECTIVE);

    let cli = Cli::parse();
    let config = LoggerConfig::from_args(&cli.logger)?;
    info!("Configuration: {:?}", config);

    let driver = PhaseDriver::global(config);
    driver
        .on_process_configure()
        .context("Failed to configure the terminal destination")?;

    for test in &cli.tests {
        run_test(&driver, test, cli.fail)?;
    }

    driver.on_process_unconfigure();
    Ok(())
}

fn run_test(driver: &PhaseDriver<'_>, test: &str, fail: bool) -> Result<()> {
    let setup = driver
        .on_test_setup_begin(test)
        .with_context(|| format!("Failed to open setup log for {}", test))?;
    info!("Setup log for {} at {:?}", test, setup);

    log().info(parts!["This is info from the setup"]);
    log().warning(parts!["This is warning from the setup"]);
    log().debug(parts!["Fixture state:", "ready"]);

    let call = driver
        .on_test_call_begin(test)
        .with_context(|| format!("Failed to open call log for {}", test))?;
    info!("Call log for {} at {:?}", test, call);

    log().info(parts!["Hello from", test]);
    log().warning(parts!["Warning from a test!"]);

    log().step(parts!["Prepare input"]);
    log().substep(parts!["Load fixture"]);
    log().substep_with(
        parts!["Values", 1, 2, 3],
        &LogOptions::new().separator(", "),
    );
    log().step(parts!["Check result"]);

    if fail {
        log().fail(parts!["Result mismatch in", test]);
    } else {
        log().passed(parts![test, "passed"]);
    }

    driver.on_test_finish(test);
    Ok(())
}
