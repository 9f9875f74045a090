use anyhow::Result;
use tempfile::TempDir;
use test_logger::{
    parts, ColorMode, LogOptions, LogRouter, LoggerConfig, LoggerError, MemorySink, PhaseDriver,
    Role,
};

fn config(dir: &TempDir, color: ColorMode) -> LoggerConfig {
    LoggerConfig {
        reports_dir: dir.path().join("reports"),
        color,
        ..LoggerConfig::default()
    }
}

/// Configure, setup and call a single test the way a host runner would.
#[test]
fn setup_and_call_phases_route_to_terminal_and_files() -> Result<()> {
    let dir = TempDir::new()?;
    let router = LogRouter::new("e2e");
    let driver = PhaseDriver::new(&router, config(&dir, ColorMode::Always));
    let terminal = MemorySink::new();

    driver.on_process_configure_with(Box::new(terminal.clone()))?;

    let setup_log = driver.on_test_setup_begin("test_hello")?;
    assert_eq!(setup_log, dir.path().join("reports/test_hello_setup.log"));
    assert!(setup_log.exists());

    router.info(parts!["This is info from the setup"]);

    let setup_contents = std::fs::read_to_string(&setup_log)?;
    assert_eq!(setup_contents.lines().count(), 1);
    assert!(setup_contents.contains("[INFO] - This is info from the setup"));

    let lines = terminal.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("\x1b[37m["));
    assert!(lines[0].ends_with("[INFO] - This is info from the setup\x1b[0m"));

    driver.on_test_call_begin("test_hello")?;
    router.warning(parts!["Warning from a test!"]);

    let lines = terminal.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("\x1b[33m["));
    assert!(lines[1].contains("[WARNING] - Warning from a test!"));

    let setup_contents = std::fs::read_to_string(&setup_log)?;
    assert!(!setup_contents.contains("Warning from a test!"));
    assert!(!router.is_attached(Role::Setup));

    let call_log = dir.path().join("reports/test_hello_call.log");
    assert!(std::fs::read_to_string(call_log)?.contains("[WARNING] - Warning from a test!"));

    driver.on_process_unconfigure();
    Ok(())
}

#[test]
fn terminal_threshold_does_not_affect_files() -> Result<()> {
    let dir = TempDir::new()?;
    let mut cfg = config(&dir, ColorMode::Never);
    cfg.term_call_loglevel = test_logger::ThresholdLevel::Warning;
    cfg.call_file_loglevel = test_logger::ThresholdLevel::Debug;

    let router = LogRouter::new("filtering");
    let driver = PhaseDriver::new(&router, cfg);
    let terminal = MemorySink::new();
    driver.on_process_configure_with(Box::new(terminal.clone()))?;
    driver.on_test_setup_begin("test_filter")?;
    let call_log = driver.on_test_call_begin("test_filter")?;

    router.debug(parts!["debug detail"]);
    router.info(parts!["info detail"]);
    router.error(parts!["an error"]);

    let terminal_text = terminal.contents();
    assert!(!terminal_text.contains("debug detail"));
    assert!(!terminal_text.contains("info detail"));
    assert!(terminal_text.contains("[ERROR] - an error"));

    let file_text = std::fs::read_to_string(call_log)?;
    assert!(file_text.contains("[DEBUG] - debug detail"));
    assert!(file_text.contains("[INFO] - info detail"));
    assert!(file_text.contains("[ERROR] - an error"));
    Ok(())
}

#[test]
fn steps_are_numbered_across_tests() -> Result<()> {
    let dir = TempDir::new()?;
    let router = LogRouter::new("steps");
    let driver = PhaseDriver::new(&router, config(&dir, ColorMode::Never));
    let terminal = MemorySink::new();
    driver.on_process_configure_with(Box::new(terminal.clone()))?;

    for test in ["test_one", "test_two"] {
        driver.on_test_setup_begin(test)?;
        driver.on_test_call_begin(test)?;
        router.step(parts!["step of", test]);
        router.substep(parts!["detail"]);
        driver.on_test_finish(test);
    }

    let tags: Vec<String> = terminal
        .lines()
        .iter()
        .filter_map(|line| line.split("] [").nth(1))
        .filter_map(|rest| rest.split(']').next())
        .map(str::to_string)
        .collect();
    assert_eq!(tags, vec!["STEP 1", "SUBSTEP 1.1", "STEP 2", "SUBSTEP 2.1"]);
    assert!(terminal.lines()[1].starts_with("   ["));

    let second = std::fs::read_to_string(dir.path().join("reports/test_two_call.log"))?;
    assert!(second.contains("[STEP 2] - step of test_two"));
    assert!(second.contains("[SUBSTEP 2.1] - detail"));
    assert!(!second.starts_with("   "));
    Ok(())
}

#[test]
fn unknown_level_writes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let router = LogRouter::new("unknown");
    let driver = PhaseDriver::new(&router, config(&dir, ColorMode::Never));
    let terminal = MemorySink::new();
    driver.on_process_configure_with(Box::new(terminal.clone()))?;
    let setup_log = driver.on_test_setup_begin("test_unknown")?;

    let err = router
        .log("notice", parts!["lost?"], &LogOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoggerError::UnknownLevel(ref name) if name == "notice"));

    assert!(terminal.contents().is_empty());
    assert!(std::fs::read_to_string(setup_log)?.is_empty());
    Ok(())
}
