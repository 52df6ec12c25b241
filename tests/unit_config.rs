mod support;

use std::fs;
use std::path::Path;

use taskdeck::config::{config_path, Config};
use taskdeck::error::Error;
use taskdeck::model::{TaskPriority, TaskStatus};

use support::TestDeck;

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_or_default(&dir.path().join("config.toml")).expect("defaults");

    assert!(config.storage.path.is_none());
    assert_eq!(config.storage.lock_timeout_ms, 5000);
    assert!(config.storage.pretty);
    assert_eq!(config.tasks.default_status().unwrap(), TaskStatus::Todo);
    assert_eq!(config.tasks.default_priority().unwrap(), TaskPriority::Medium);
    assert_eq!(config.dashboard.trend_days, 7);
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    let toml = r#"
[storage]
path = "/srv/tasks/state.json"
lock_timeout_ms = 250
pretty = false

[tasks]
default_status = "paused"
default_priority = "high"

[dashboard]
trend_days = 30
"#;
    fs::write(&path, toml)?;

    let config = Config::load(&path)?;
    assert_eq!(
        config.storage.path.as_deref(),
        Some(Path::new("/srv/tasks/state.json"))
    );
    assert_eq!(config.storage.lock_timeout_ms, 250);
    assert!(!config.storage.pretty);
    assert_eq!(config.tasks.default_status()?, TaskStatus::Paused);
    assert_eq!(config.tasks.default_priority()?, TaskPriority::High);
    assert_eq!(config.dashboard.trend_days, 30);
    assert_eq!(
        config.snapshot_path(None),
        Path::new("/srv/tasks/state.json")
    );
    assert_eq!(
        config.snapshot_path(Some(Path::new("other.json"))),
        Path::new("other.json")
    );

    Ok(())
}

#[test]
fn invalid_values_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");

    for bad in [
        "[tasks]\ndefault_status = \"DONE\"\n",
        "[tasks]\ndefault_priority = \"URGENT\"\n",
        "[dashboard]\ntrend_days = 0\n",
        "[storage]\nlock_timeout_ms = 0\n",
    ] {
        fs::write(&path, bad).expect("write");
        let err = Config::load(&path).expect_err(bad);
        assert!(matches!(err, Error::InvalidConfig(_)), "{bad}: {err}");
    }

    fs::write(&path, "[tasks\n").expect("write");
    assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
}

#[test]
fn config_file_sits_beside_snapshot() {
    assert_eq!(
        config_path(None, Path::new("/data/deck/task-manager-storage.json")),
        Path::new("/data/deck/config.toml")
    );
    assert_eq!(
        config_path(Some(Path::new("/etc/taskdeck.toml")), Path::new("/data/x.json")),
        Path::new("/etc/taskdeck.toml")
    );
}

#[test]
fn cli_reports_invalid_config() {
    let deck = TestDeck::new();
    deck.write_config("[dashboard]\ntrend_days = 999\n")
        .expect("write config");

    let err = deck.json_err(&["stats"], 2);
    assert_eq!(err["error"]["kind"], "user_error");
    assert!(err["error"]["message"]
        .as_str()
        .unwrap()
        .contains("dashboard.trend_days"));
}

#[test]
fn cli_honors_explicit_config_flag() {
    let deck = TestDeck::new();
    let custom = deck.path().join("custom.toml");
    fs::write(&custom, "[tasks]\ndefault_priority = \"LOW\"\n").expect("write");

    let value = deck.json(&[
        "--config",
        custom.to_str().unwrap(),
        "task",
        "add",
        "Configured",
    ]);
    assert_eq!(value["data"]["priority"], "LOW");
    assert_eq!(value["command"], "task add");
}

#[test]
fn compact_snapshot_when_pretty_disabled() {
    let deck = TestDeck::new();
    deck.write_config("[storage]\npretty = false\n").expect("write config");
    deck.add_task("Compact", &[]);

    let raw = fs::read_to_string(deck.snapshot_path()).expect("snapshot");
    assert_eq!(raw.trim_end().lines().count(), 1);
}
