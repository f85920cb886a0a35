use std::fs;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

// Drives the compiled binary's non-interactive paths

fn beewise(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("beewise").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn stats_reports_level_and_weak_words() {
    let home = tempdir().unwrap();
    let users = home.path().join("users");
    fs::create_dir_all(&users).unwrap();
    fs::write(
        users.join("alice.csv"),
        "session_id,word_typed,correct_word,level,similarity_score\n\
         1700000000.25,honey,honey,2,1.0\n\
         1700000000.25,pithon,python,1,0.5\n\
         1700000100.5,pythin,python,1,0.6\n",
    )
    .unwrap();

    let output = beewise(&home)
        .args(["--stats", "--user", "Alice", "--users-dir"])
        .arg(&users)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("learner: Alice"));
    assert!(stdout.contains("records: 3 across 2 sessions"));
    assert!(stdout.contains("level: 2"));
    assert!(stdout.contains("python 55% (level 1, 2 attempts)"));
}

#[test]
fn stats_for_unknown_learner_starts_at_level_one() {
    let home = tempdir().unwrap();

    let output = beewise(&home)
        .args(["--stats", "-u", "nobody", "--users-dir"])
        .arg(home.path().join("users"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("level: 1"));
    assert!(stdout.contains("weak words: none"));
}

#[test]
fn stats_with_corrupt_history_falls_back_to_empty() {
    let home = tempdir().unwrap();
    let users = home.path().join("users");
    fs::create_dir_all(&users).unwrap();
    fs::write(users.join("carol.csv"), "session_id,word_typed\nnot,a,valid,row\n").unwrap();

    let output = beewise(&home)
        .args(["--stats", "-u", "carol", "--users-dir"])
        .arg(&users)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("records: 0 across 0 sessions"));
}

#[test]
fn stats_requires_a_user() {
    let home = tempdir().unwrap();
    beewise(&home).arg("--stats").assert().failure();
}

#[test]
fn zero_words_is_rejected() {
    let home = tempdir().unwrap();
    beewise(&home).args(["-w", "0"]).assert().failure();
}

#[test]
fn save_config_writes_settings() {
    let home = tempdir().unwrap();

    beewise(&home)
        .args(["--save-config", "--stats", "-u", "dana", "-w", "7", "--mute"])
        .assert()
        .success();

    let saved = walk_json(home.path()).expect("config file written");
    let text = fs::read_to_string(saved).unwrap();
    assert!(text.contains("\"session_size\": 7"));
    assert!(text.contains("\"speech\": false"));
}

fn walk_json(dir: &std::path::Path) -> Option<std::path::PathBuf> {
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = walk_json(&path) {
                return Some(found);
            }
        } else if path.extension().is_some_and(|e| e == "json") {
            return Some(path);
        }
    }
    None
}

#[test]
fn interactive_mode_needs_a_tty() {
    let home = tempdir().unwrap();
    beewise(&home).arg("--mute").write_stdin("").assert().failure();
}
