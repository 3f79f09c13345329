use std::fs;
use std::io::Cursor;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn excelab() -> Command {
    let mut cmd = Command::cargo_bin("excelab").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_preview_json() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "id,name\n1,Ann\n2,Bob\n");
    let b = write(dir.path(), "b.csv", "id,email\n3,c@x.io\n");

    let output = excelab()
        .args(["preview", a.as_str(), b.as_str(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["columns"], serde_json::json!(["id", "name", "email"]));
    assert_eq!(body["total_rows"], 3);
    assert_eq!(body["data"][2]["name"], "");
}

#[test]
fn test_merge_writes_workbook() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "id,name\n1,Ann\n");
    let b = write(dir.path(), "b.csv", "id,email\n2,b@x.io\n");
    let out = dir.path().join("merged.xlsx");

    excelab()
        .args(["merge", a.as_str(), b.as_str(), "--mode", "intersection", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 file(s)"));

    let bytes = fs::read(&out).unwrap();
    // xlsx files are zip containers
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_intersection_without_common_columns_is_input_error() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "x\n1\n");
    let b = write(dir.path(), "b.csv", "y\n2\n");

    excelab()
        .args(["preview", a.as_str(), b.as_str(), "--mode", "intersection"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no columns in common"));
}

#[test]
fn test_columns() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "data.csv", "sku,,qty,qty\n1,2,3,4\n");

    excelab()
        .args(["columns", file.as_str()])
        .assert()
        .success()
        .stdout("sku\nUnnamed: 1\nqty\nqty.1\n");
}

#[test]
fn test_split_produces_archive() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "orders.csv", "region,n\nwest,1\neast,2\nwest,3\n");
    let out = dir.path().join("split_files.zip");

    excelab()
        .args(["split", file.as_str(), "--column", "region", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 group file(s)"));

    let archive = zip::ZipArchive::new(Cursor::new(fs::read(&out).unwrap())).unwrap();
    let mut names: Vec<_> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["east_split.xlsx", "west_split.xlsx"]);
}

#[test]
fn test_split_unknown_column() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "orders.csv", "region,n\nwest,1\n");

    excelab()
        .args(["split", file.as_str(), "--column", "country"])
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("country"));
}

#[test]
fn test_clean_preview() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "messy.csv", "a,b,c\n1, x ,\n,,\n2,y,\n");

    excelab()
        .args(["clean", file.as_str(), "--trim", "--preview", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cleaned_rows\": 2"))
        .stdout(predicate::str::contains("\"trim_spaces\""));
}

#[test]
fn test_missing_file() {
    excelab()
        .args(["columns", "does-not-exist.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_unsupported_only_is_empty_input() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "notes.txt", "hello");

    excelab()
        .args(["preview", file.as_str()])
        .assert()
        .code(1);
}
