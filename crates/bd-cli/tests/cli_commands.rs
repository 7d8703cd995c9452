//! Integration tests for the bd-cli binary.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write an encounter file into a fresh temp directory.
fn encounter(json: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("encounter.json");
    fs::write(&path, json).unwrap();
    (dir, path)
}

fn duel() -> (TempDir, PathBuf) {
    encounter(
        r#"{
    "name": "Gate Skirmish",
    "friends": [
        { "name": "Paladin", "stats": { "max_hp": 36, "speed": 11, "attack": 9, "defense": 2 },
          "attack_type": "Holy", "starting_buffs": ["Shield"] }
    ],
    "foes": [
        { "name": "Imp", "stats": { "max_hp": 18, "speed": 12, "attack": 5, "defense": 1 },
          "defense_type": "Infernal", "starting_buffs": ["Poison"] },
        null
    ]
}"#,
    )
}

fn bd() -> Command {
    let mut cmd = Command::cargo_bin("bd").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    bd().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fight"))
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn fight_prints_log_and_table() {
    let (_dir, path) = duel();
    bd().arg("fight")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Gate Skirmish"))
        .stdout(predicate::str::contains("Event Log"))
        .stdout(predicate::str::contains("Paladin"))
        .stdout(predicate::str::contains("VICTORY"))
        .stderr(predicate::str::contains("skipped 1 malformed"));
}

#[test]
fn fight_json_output() {
    let (_dir, path) = duel();
    let output = bd()
        .args(["fight", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["encounter"], "Gate Skirmish");
    assert_eq!(report["result"], "victory");
    assert_eq!(report["combatants"].as_array().unwrap().len(), 2);

    let events = report["events"].as_array().unwrap();
    assert_eq!(events.last().unwrap()["event"]["kind"], "battle_ended");
    assert!(
        events
            .iter()
            .any(|e| e["event"]["kind"] == "damage_dealt" && e["event"]["absorbed"] != 0)
    );
}

#[test]
fn random_strategy_is_repeatable() {
    let (_dir, path) = encounter(
        r#"{
    "friends": [{ "name": "Archer", "stats": { "max_hp": 40, "speed": 9, "attack": 4 } }],
    "foes": [
        { "name": "A", "stats": { "max_hp": 9, "speed": 2, "attack": 1 } },
        { "name": "B", "stats": { "max_hp": 9, "speed": 1, "attack": 1 } }
    ]
}"#,
    );
    let run = || {
        bd().args(["fight", "--json", "--strategy", "random", "--seed", "11"])
            .arg(&path)
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn round_cap_reports_unresolved() {
    let (_dir, path) = encounter(
        r#"{
    "friends": [{ "name": "Wall", "stats": { "max_hp": 50, "speed": 2, "defense": 9 } }],
    "foes": [{ "name": "Pebble", "stats": { "max_hp": 50, "speed": 1, "defense": 9 } }]
}"#,
    );
    bd().args(["fight", "--max-rounds", "3"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("UNRESOLVED"))
        .stdout(predicate::str::contains("round cap of 3 reached"));
}

#[test]
fn empty_foes_is_victory() {
    let (_dir, path) = encounter(
        r#"{ "friends": [{ "name": "Knight", "stats": { "max_hp": 10 } }], "foes": [] }"#,
    );
    bd().args(["fight", "--json"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"victory\""));
}

#[test]
fn verbose_logs_to_stderr() {
    let (_dir, path) = duel();
    bd().args(["fight", "--verbose", "--json"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("turn started"));
}

#[test]
fn missing_file_fails() {
    bd().args(["fight", "/nonexistent/encounter.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot read"));
}

#[test]
fn malformed_file_fails() {
    let (_dir, path) = encounter("{ not json");
    bd().arg("fight")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid encounter file"));
}

#[test]
fn catalog_lists_builtins() {
    bd().arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stunned"))
        .stdout(predicate::str::contains("Channeling"))
        .stdout(predicate::str::contains("Poison"))
        .stdout(predicate::str::contains("Shield"))
        .stdout(predicate::str::contains("x1.25"));
}
