mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;

fn csv_table() -> Command {
    Command::cargo_bin("csv-table").expect("binary exists")
}

#[test]
fn format_writes_data_rows_to_stdout() {
    let fixture = fixture_path("test.csv");
    csv_table()
        .args(["format", "-i", fixture.to_str().unwrap(), "--header"])
        .assert()
        .success()
        .stdout("\"Candy Man\",\"Candy Man\",\"Candy Man\"\n");
}

#[test]
fn format_honours_dialect_flags_and_output_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("in.csv", "id,name\n1,  Ada\tLovelace \n");
    let output = workspace.path().join("out.csv");

    csv_table()
        .args([
            "format",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--delimiter",
            ";",
            "--enclosure",
            "single",
            "--eol",
            "crlf",
            "--quote-all",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&output).expect("read output");
    assert_eq!(written, "'id';'name'\r\n'1';'Ada Lovelace'\r\n");
}

#[test]
fn format_transcodes_output_encoding() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("in.csv", "café\n");
    let output = workspace.path().join("out.csv");

    csv_table()
        .args([
            "format",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--output-encoding",
            "windows-1252",
        ])
        .assert()
        .success();

    assert_eq!(fs::read(&output).expect("read output"), b"caf\xe9\n");
}

#[test]
fn format_rejects_conflicting_dialect() {
    let fixture = fixture_path("test.csv");
    csv_table()
        .args([
            "format",
            "-i",
            fixture.to_str().unwrap(),
            "--delimiter",
            ",",
            "--enclosure",
            ",",
        ])
        .assert()
        .failure()
        .stderr(contains("invalid CSV dialect"));
}

#[test]
fn format_reports_missing_input() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("missing.csv");
    csv_table()
        .args(["format", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Opening input file"));
}

#[test]
fn column_prints_values_by_index_and_name() {
    let fixture = fixture_path("test.csv");
    csv_table()
        .args(["column", "-i", fixture.to_str().unwrap(), "-k", "1"])
        .assert()
        .success()
        .stdout("column_2\nCandy Man\n");

    csv_table()
        .args([
            "column",
            "-i",
            fixture.to_str().unwrap(),
            "--header",
            "-k",
            "column_2",
        ])
        .assert()
        .success()
        .stdout("Candy Man\n");
}

#[test]
fn column_uses_default_for_missing_cells() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ragged.csv", "a,b\nc\n");
    csv_table()
        .args([
            "column",
            "-i",
            input.to_str().unwrap(),
            "-k",
            "1",
            "--default",
            "n/a",
        ])
        .assert()
        .success()
        .stdout("b\nn/a\n");
}

#[test]
fn column_requires_numeric_key_without_header() {
    let fixture = fixture_path("test.csv");
    csv_table()
        .args(["column", "-i", fixture.to_str().unwrap(), "-k", "column_2"])
        .assert()
        .failure()
        .stderr(contains("zero-based index"));
}

#[test]
fn dump_prints_rows_as_json() {
    let fixture = fixture_path("test.csv");
    let output = csv_table()
        .args(["dump", "-i", fixture.to_str().unwrap(), "--header"])
        .output()
        .expect("run dump");
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(rows[0]["column_3"], "Candy Man");
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
}
