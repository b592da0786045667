//! Batch extraction scenarios

use std::fs;
use std::path::Path;

use soulcore_codec::{
    batch::{extract_file, list_png_files, run_batch, BatchConfig, BatchError, FileStatus},
    embed, embed_compressed, qr,
};

mod common;

use common::TINY_PNG;

fn write_card(dir: &Path, name: &str, keyword: &str, payload: &str) {
    let png = embed(&TINY_PNG, keyword, payload).unwrap();
    fs::write(dir.join(name), png).unwrap();
}

#[test]
fn test_three_files_one_without_payload() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_card(input.path(), "rin.png", "chara", r#"{"name":"Rin"}"#);
    write_card(input.path(), "mio.PNG", "IZAKAYA_SOULCORE", r#"{"name":"Mio"}"#);
    fs::write(input.path().join("plain.png"), TINY_PNG).unwrap();
    fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let config = BatchConfig {
        input: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        verify_crc: false,
    };
    let report = run_batch(&config).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.extracted(), 2);
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.failures(), 0);

    let written: Vec<_> = fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(written.len(), 2);

    let rin = fs::read_to_string(output.path().join("rin.json")).unwrap();
    assert_eq!(rin, "{\n  \"name\": \"Rin\"\n}");
    assert!(output.path().join("mio.json").exists());
}

#[test]
fn test_failures_do_not_abort_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    fs::write(input.path().join("a_broken.png"), b"not a png at all").unwrap();
    write_card(input.path(), "b_badjson.png", "chara", "{oops");
    write_card(input.path(), "c_good.png", "soulcore", r#"{"ok":true}"#);

    let mut config = BatchConfig::new(input.path());
    config.output_dir = output.path().join("nested").join("out");
    let report = run_batch(&config).unwrap();

    assert_eq!(report.extracted(), 1);
    assert_eq!(report.failures(), 2);
    assert!(config.output_dir.join("c_good.json").exists());
    match &report.outcomes[0].status {
        FileStatus::Failed { reason } => assert!(reason.contains("signature")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_single_file_input() {
    let input = tempfile::tempdir().unwrap();
    write_card(input.path(), "solo.png", "chara", r#"{"solo":1}"#);
    let files = list_png_files(&input.path().join("solo.png")).unwrap();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_key_order_preserved() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_card(input.path(), "order.png", "chara", r#"{"z":1,"a":2}"#);

    let config = BatchConfig {
        input: input.path().join("order.png"),
        output_dir: output.path().to_path_buf(),
        verify_crc: true,
    };
    run_batch(&config).unwrap();
    let text = fs::read_to_string(output.path().join("order.json")).unwrap();
    assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
}

#[test]
fn test_extract_file_resolves_qr_and_compressed_carriers() {
    let dir = tempfile::tempdir().unwrap();

    let assets = qr::generate(r#"{"via":"qr"}"#).unwrap();
    let qr_path = dir.path().join("qr.png");
    fs::write(&qr_path, &assets.embedded_image).unwrap();
    assert_eq!(extract_file(&qr_path, true).unwrap()["via"], "qr");

    let zipped = embed_compressed(&TINY_PNG, "soulcore-v2", r#"{"via":"ztxt"}"#).unwrap();
    let zipped_path = dir.path().join("zipped.png");
    fs::write(&zipped_path, zipped).unwrap();
    assert_eq!(extract_file(&zipped_path, false).unwrap()["via"], "ztxt");

    let raw_path = dir.path().join("raw.png");
    fs::write(&raw_path, &assets.raw_image).unwrap();
    assert!(matches!(extract_file(&raw_path, false), Err(BatchError::NoPayload)));
}

#[test]
fn test_missing_input_is_an_error() {
    let output = tempfile::tempdir().unwrap();
    let config = BatchConfig {
        input: output.path().join("does-not-exist"),
        output_dir: output.path().to_path_buf(),
        verify_crc: false,
    };
    assert!(run_batch(&config).is_err());
}
