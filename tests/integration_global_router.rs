use anyhow::Result;
use tempfile::TempDir;
use test_logger::{log, parts, ColorMode, LoggerConfig, MemorySink, PhaseDriver, Role};

/// The process-global router is shared by the driver and by test code.
#[test]
fn global_router_is_shared() -> Result<()> {
    let dir = TempDir::new()?;
    let driver = PhaseDriver::global(LoggerConfig {
        reports_dir: dir.path().to_path_buf(),
        color: ColorMode::Never,
        term_format: "{level}{step}: {message}".to_string(),
        ..LoggerConfig::default()
    });
    assert!(std::ptr::eq(driver.router(), log()));

    let terminal = MemorySink::new();
    driver.on_process_configure_with(Box::new(terminal.clone()))?;
    driver.on_process_configure_with(Box::new(terminal.clone()))?;
    assert_eq!(log().attached_roles(), vec![Role::Terminal]);

    driver.on_test_setup_begin("test_global")?;
    log().passed(parts!["fixture ready"]);
    log().info_with(parts!["skipped"], &test_logger::LogOptions::new().enabled(false));

    assert_eq!(terminal.lines(), vec!["PASS: fixture ready"]);
    assert!(dir.path().join("test_global_setup.log").exists());

    driver.on_process_unconfigure();
    assert!(log().attached_roles().is_empty());
    Ok(())
}
