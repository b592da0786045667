//! png2json binary behavior: exit codes, output files, log lines.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use soulcore_codec::embed;

mod common;

use common::TINY_PNG;

fn png2json(cwd: &Path, args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_png2json"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

fn stderr_lines_with(output: &Output, needle: &str) -> usize {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| line.contains(needle))
        .count()
}

#[test]
fn test_missing_argument_exits_non_zero() {
    let cwd = tempfile::tempdir().unwrap();
    let output = png2json(cwd.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn test_unreadable_input_still_exits_zero() {
    let cwd = tempfile::tempdir().unwrap();
    let missing = cwd.path().join("nowhere");
    let output = png2json(cwd.path(), &[&missing]);
    assert!(output.status.success());
    assert_eq!(stderr_lines_with(&output, "ERROR"), 1);
}

#[test]
fn test_directory_run_writes_json_and_warns_once() {
    let cwd = tempfile::tempdir().unwrap();
    let input = cwd.path().join("cards");
    let out = cwd.path().join("json");
    fs::create_dir(&input).unwrap();

    fs::write(input.join("rin.png"), embed(&TINY_PNG, "chara", r#"{"name":"Rin"}"#).unwrap()).unwrap();
    fs::write(
        input.join("mio.png"),
        embed(&TINY_PNG, "IZAKAYA_SOULCORE", r#"{"name":"Mio"}"#).unwrap(),
    )
    .unwrap();
    fs::write(input.join("plain.png"), TINY_PNG).unwrap();

    let output = png2json(cwd.path(), &[&input, &out]);
    assert!(output.status.success());

    let mut written: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    written.sort();
    assert_eq!(written, vec!["mio.json", "rin.json"]);

    assert_eq!(stderr_lines_with(&output, "WARN"), 1);
    assert_eq!(stderr_lines_with(&output, "plain.png"), 1);
}

#[test]
fn test_default_output_dir() {
    let cwd = tempfile::tempdir().unwrap();
    let card = cwd.path().join("solo.png");
    fs::write(&card, embed(&TINY_PNG, "chara", r#"{"solo":1}"#).unwrap()).unwrap();

    let output = png2json(cwd.path(), &[&card]);
    assert!(output.status.success());
    assert!(cwd.path().join("png2json-output").join("solo.json").exists());
}
