// tests/cli_tests.rs - one-shot runs of the gatelog binary
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn sample_log() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "plain text line").unwrap();
    writeln!(
        file,
        r#"{{"level":30,"time":1700000000000,"msg":"hello","module":"sys"}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"0":"started","_meta":{{"logLevelName":"ERROR","name":"svc"}}}}"#
    )
    .unwrap();
    file
}

#[test]
fn test_one_shot_render() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("plain text line"))
        .stdout(predicate::str::contains("INFO  [sys] hello"))
        .stdout(predicate::str::contains("ERROR [svc] started"))
        .stdout(predicate::str::contains("1 errors, 0 warnings in view"));
}

#[test]
fn test_level_filter_flag() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .args(["--no-color", "--level", "error"])
        .assert()
        .success()
        // unstructured lines are never hidden by level filtering
        .stdout(predicate::str::contains("plain text line"))
        .stdout(predicate::str::contains("started"))
        .stdout(predicate::str::contains("hello").not());
}

#[test]
fn test_grep_flag() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .args(["--no-color", "--grep", "HELLO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("plain text line").not());
}

#[test]
fn test_export_flag_writes_filtered_raw_lines() {
    let file = sample_log();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("export.txt");

    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .args(["--level", "error", "--export"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    // Verbatim raw lines, newline-joined
    assert!(content.contains("plain text line"));
    assert!(content.contains(r#""logLevelName":"ERROR""#));
    assert!(!content.contains(r#""msg":"hello""#));
}

#[test]
fn test_json_output_mode() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""level":"info""#))
        .stdout(predicate::str::contains(r#""raw":"plain text line""#));
}

#[test]
fn test_unknown_level_is_a_cli_error() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .args(["--level", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown level 'loud'"));
}

#[test]
fn test_missing_file_is_a_cli_error() {
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg("/nonexistent/gateway.log")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_bad_limit_rejected_by_clap() {
    let file = sample_log();
    let mut cmd = Command::cargo_bin("gatelog").unwrap();
    cmd.arg(file.path())
        .args(["--limit", "640"])
        .assert()
        .failure();
}
