#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Fixed "now" used by CLI tests
pub const NOW: &str = "2024-06-15T12:00";

/// An isolated data directory for one test
pub struct TestDeck {
    dir: TempDir,
}

impl TestDeck {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.path().join("task-manager-storage.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.config_path();
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_snapshot(&self) -> Value {
        let raw = fs::read_to_string(self.snapshot_path()).expect("read snapshot");
        serde_json::from_str(&raw).expect("snapshot json")
    }

    /// Command with the data file pinned to this deck and "now" pinned to [`NOW`]
    pub fn cmd(&self) -> Command {
        self.cmd_at(NOW)
    }

    pub fn cmd_at(&self, now: &str) -> Command {
        let mut cmd = taskdeck_cmd();
        cmd.current_dir(self.path())
            .env("TASKDECK_DATA", self.snapshot_path())
            .env("TASKDECK_NOW", now);
        cmd
    }

    /// Run with `--json` and return the parsed envelope, asserting success
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Run with `--json`, expect failure with `code`, return the error envelope
    pub fn json_err(&self, args: &[&str], code: i32) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .code(code)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json error envelope")
    }

    pub fn add_task(&self, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "add", title];
        args.extend_from_slice(extra);
        let value = self.json(&args);
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    pub fn add_tag(&self, name: &str) -> String {
        let value = self.json(&["tag", "add", name]);
        value["data"]["id"].as_str().expect("tag id").to_string()
    }
}

/// Binary under test with ambient taskdeck env vars cleared
pub fn taskdeck_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskdeck").expect("binary");
    cmd.env_remove("TASKDECK_DATA")
        .env_remove("TASKDECK_CONFIG")
        .env_remove("TASKDECK_NOW")
        .env_remove("RUST_LOG");
    cmd
}
