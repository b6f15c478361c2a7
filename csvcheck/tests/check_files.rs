//! End-to-end runs over files on disk.

use csvcheck::{check_files, CheckOptions, FailureKind, Location, Outcome, SchemaFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn typed() -> CheckOptions {
    let mut options = CheckOptions::default();
    options.read.dynamic_typing = true;
    options
}

const AGE_RULES: &str = r#"{
    "type": "object",
    "properties": { "age": { "type": "number" } }
}"#;

#[tokio::test]
async fn test_numeric_age_scenario() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "people.csv", b"name,age\nAlice,30\nBob,notanumber\n");
    let rules = write(&dir, "rules.json", AGE_RULES.as_bytes());

    let outcome = check_files(&csv, &rules, &typed()).await.unwrap();

    match outcome {
        Outcome::ValidationFailed { violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].row.get(), 2);
            assert_eq!(violations[0].field, "age");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_abort_early_scenario() {
    let csv = fixture("people.csv");
    let rules = fixture("people.schema.json");

    let exhaustive = check_files(&csv, &rules, &typed()).await.unwrap();
    let lines = exhaustive.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.starts_with("Error at row 2: Field ")));

    let mut options = typed();
    options.validate.abort_early = true;
    let narrowed = check_files(&csv, &rules, &options).await.unwrap();
    assert_eq!(narrowed.lines().len(), 1);
    assert_eq!(narrowed.exit_code(), 1);
}

#[tokio::test]
async fn test_yaml_rules_match_json_rules() {
    let csv = fixture("people.csv");

    let from_json = check_files(&csv, &fixture("people.schema.json"), &typed()).await.unwrap();

    let mut options = typed();
    options.schema.format = SchemaFormat::Yaml;
    let from_yaml = check_files(&csv, &fixture("people.schema.yaml"), &options).await.unwrap();

    assert_eq!(from_json, from_yaml);
}

#[tokio::test]
async fn test_untyped_cells_are_strings() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "people.csv", b"name,age\nAlice,30\n");
    let rules = write(&dir, "rules.json", AGE_RULES.as_bytes());

    let outcome = check_files(&csv, &rules, &CheckOptions::default()).await.unwrap();
    assert_eq!(outcome.lines().len(), 1);

    let outcome = check_files(&csv, &rules, &typed()).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_every_row_reported() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "data.csv", b"name,age\nA,x\nB,2\nC,y\nD,4\nE,z\n");
    let rules = write(&dir, "rules.json", AGE_RULES.as_bytes());

    let mut options = typed();
    options.validate.abort_early = true;
    let outcome = check_files(&csv, &rules, &options).await.unwrap();

    let rows: Vec<usize> = match outcome {
        Outcome::ValidationFailed { violations } => violations.iter().map(|v| v.row.get()).collect(),
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(rows, vec![1, 3, 5]);
}

#[tokio::test]
async fn test_all_parse_failures_together() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "data.csv", b"a,b\n1\n2,3\n4,5,6\n");
    let rules = write(&dir, "rules.json", b"{}");

    let outcome = check_files(&csv, &rules, &CheckOptions::default()).await.unwrap();

    assert_eq!(
        outcome.lines(),
        vec![
            "Error at row 1: Too few fields: expected 2 fields but parsed 1.",
            "Error at row 3: Too many fields: expected 2 fields but parsed 3.",
        ]
    );
}

#[tokio::test]
async fn test_missing_csv_file() {
    let dir = TempDir::new().unwrap();
    let rules = write(&dir, "rules.json", b"{}");

    let outcome = check_files(&dir.path().join("absent.csv"), &rules, &CheckOptions::default())
        .await
        .unwrap();

    match outcome {
        Outcome::ParseFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].kind, FailureKind::Io);
            assert_eq!(failures[0].location, Location::Input);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_broken_schema_discards_records() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "data.csv", b"a\n1\n");
    let rules = write(&dir, "rules.json", b"[1, 2");

    let outcome = check_files(&csv, &rules, &CheckOptions::default()).await.unwrap();

    match outcome {
        Outcome::ParseFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].location, Location::Schema);
            assert_eq!(failures[0].kind, FailureKind::Syntax);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_skip_empty_lines() {
    let dir = TempDir::new().unwrap();
    let csv = write(&dir, "data.csv", b"a,b\n1,2\n,\n3,4\n");
    let rules = write(
        &dir,
        "rules.json",
        br#"{ "properties": { "a": { "type": "number" } } }"#,
    );

    let kept = check_files(&csv, &rules, &typed()).await.unwrap();
    let lines = kept.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Error at row 2: Field a does not satisfy 'type'"));

    let mut options = typed();
    options.read.skip_empty_lines = true;
    let skipped = check_files(&csv, &rules, &options).await.unwrap();
    assert!(skipped.is_success());
}

#[tokio::test]
async fn test_latin1_file() {
    let dir = TempDir::new().unwrap();
    let mut bytes = b"city\n".to_vec();
    bytes.extend_from_slice(&[0x4D, 0xFC, 0x6E, 0x63, 0x68, 0x65, 0x6E, b'\n']); // "München"
    let csv = write(&dir, "data.csv", &bytes);
    let rules = write(
        &dir,
        "rules.json",
        r#"{ "properties": { "city": { "enum": ["München"] } } }"#.as_bytes(),
    );

    let utf8 = check_files(&csv, &rules, &CheckOptions::default()).await.unwrap();
    assert!(matches!(utf8, Outcome::ParseFailed { .. }));

    // The schema file is UTF-8, so only the CSV gets the latin-1 label.
    let mut options = CheckOptions::default();
    options.read.encoding = "latin1".to_string();
    let latin1 = check_files(&csv, &rules, &options).await.unwrap();
    assert!(latin1.is_success());
}

#[tokio::test]
async fn test_parallel_jobs_same_outcome() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("name,age\n");
    for i in 0..50 {
        if i % 5 == 0 {
            content.push_str(&format!("P{},bad\n", i));
        } else {
            content.push_str(&format!("P{},{}\n", i, i));
        }
    }
    let csv = write(&dir, "data.csv", content.as_bytes());
    let rules = write(&dir, "rules.json", AGE_RULES.as_bytes());

    let sequential = check_files(&csv, &rules, &typed()).await.unwrap();

    let mut options = typed();
    options.validate.jobs = 4;
    let parallel = check_files(&csv, &rules, &options).await.unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.lines().len(), 10);
}
