use assert_cmd::prelude::*;
use std::path::Path;
use std::process::Command;

fn rosterbot(dir: &Path, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rosterbot").expect("binary built");
    cmd.current_dir(dir).arg("--config").arg(config);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

#[test]
fn canon_reorders_comma_names() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let out = stdout_of(rosterbot(dir.path(), &config).args(["canon", "Doe, Jane", "Prince"]));
    assert_eq!(out.lines().collect::<Vec<_>>(), ["Jane Doe", "Prince"]);
}

#[test]
fn config_reset_then_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("conf").join("config.yaml");

    let out = stdout_of(rosterbot(dir.path(), &config).args(["config", "reset"]));
    assert!(out.contains("reset to defaults"));
    assert!(config.exists());

    let out = stdout_of(rosterbot(dir.path(), &config).args(["config", "validate"]));
    assert!(out.contains("is valid"));
}

#[test]
fn invalid_config_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "timeouts: nope\n").unwrap();

    rosterbot(dir.path(), &config)
        .args(["config", "show"])
        .assert()
        .failure();
}

#[test]
fn show_applies_environment_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "webdriver:\n  url: http://file:4444\n").unwrap();

    let out = stdout_of(
        rosterbot(dir.path(), &config)
            .env("ROSTERBOT_WEBDRIVER_URL", "http://env:4444")
            .args(["config", "show"]),
    );
    assert!(out.contains("http://env:4444"));
    assert!(!out.contains("http://file:4444"));
}

#[test]
fn local_env_file_feeds_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::create_dir_all(dir.path().join("config")).unwrap();
    std::fs::write(
        dir.path().join("config").join("local.env"),
        "ROSTERBOT_START_URL=https://club.example/login\n",
    )
    .unwrap();

    let out = stdout_of(
        rosterbot(dir.path(), &config)
            .env_remove("ROSTERBOT_START_URL")
            .args(["config", "show"]),
    );
    assert!(out.contains("https://club.example/login"));
}
