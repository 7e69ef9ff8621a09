use stories::config::{load_settings, save_settings, ConfigError, LogLevel, Settings};
use stories::runtime::StatePaths;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let paths = StatePaths::new(dir.path());

    let settings = load_settings(&paths).expect("defaults");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.agent.provider, "aichat");
    assert!(settings.execution.auto_confirm);
    assert_eq!(
        settings.execution.pause_between_steps(),
        Duration::from_secs(1)
    );
    assert_eq!(settings.execution.log_level, LogLevel::Normal);
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let dir = tempdir().expect("tempdir");
    let paths = StatePaths::new(dir.path());
    fs::write(paths.settings_file(), "agent: [unclosed").expect("write");

    let err = load_settings(&paths).expect_err("bad yaml");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn out_of_range_temperature_fails_validation() {
    let dir = tempdir().expect("tempdir");
    let paths = StatePaths::new(dir.path());
    fs::write(paths.settings_file(), "agent:\n  provider: claude\n  temperature: 3.5\n")
        .expect("write");

    let err = load_settings(&paths).expect_err("temperature");
    assert!(err.to_string().contains("temperature"));
}

#[test]
fn execution_changes_survive_a_save() {
    let dir = tempdir().expect("tempdir");
    let paths = StatePaths::new(dir.path());
    let mut settings = load_settings(&paths).expect("defaults");
    settings
        .execution
        .apply("log-level", "minimal")
        .expect("log level");
    settings.execution.apply("pause-ms", "250").expect("pause");

    save_settings(&paths, &settings).expect("save");
    let raw = fs::read_to_string(paths.settings_file()).expect("read");
    assert!(raw.contains("log_level: minimal"));

    let loaded = load_settings(&paths).expect("reload");
    assert_eq!(loaded.execution.log_level, LogLevel::Minimal);
    assert_eq!(loaded.execution.pause_between_steps_ms, 250);
}
