//! Integration tests for the dafkesher query and export commands

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const SAMPLE_DATA: &str = r#"[
    {"firstName":"דנה","lastName":"כהן","pluga":"א","framework":"חוד",
     "role":"מפקדת","mobile":"050-1234567","mobileE164":"+972501234567","mobileWA":"972501234567"},
    {"firstName":"אבי","lastName":"לוי","pluga":"א","framework":"חוד",
     "role":"סמל","mobile":"050-2222222","mobileE164":"+972502222222","mobileWA":"972502222222"},
    {"firstName":"גל","lastName":"מזרחי","pluga":"א","framework":"עורף","role":"חובש"},
    {"firstName":"שרה","lastName":"ברק","pluga":"צוות/מיוחד","framework":"חוד","role":"קצינה"}
]"#;

/// Test environment with a data file and an isolated export directory
struct TestEnv {
    temp_dir: TempDir,
    data_path: PathBuf,
    export_dir: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("data.json");
        let export_dir = temp_dir.path().join("exports");
        fs::write(&data_path, SAMPLE_DATA).unwrap();

        Self {
            temp_dir,
            data_path,
            export_dir,
        }
    }

    /// Run dafkesher against this test env's data file
    fn dafkesher(&self) -> AssertCommand {
        let mut cmd = dafkesher_cmd();
        cmd.args(["--data", self.data_path.to_str().unwrap()]);
        cmd
    }

    fn exported_vcf_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.export_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.extension().map(|ext| ext == "vcf").unwrap_or(false))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Get the dafkesher binary command
fn dafkesher_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("dafkesher").unwrap()
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_finds_by_name() {
    let env = TestEnv::new();

    env.dafkesher()
        .args(["query", "דנה"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 contact(s) matching \"דנה\""))
        .stdout(predicate::str::contains("דנה כהן"))
        .stdout(predicate::str::contains("050-1234567"));
}

#[test]
fn test_query_finds_by_role() {
    let env = TestEnv::new();

    env.dafkesher()
        .args(["query", "חובש"])
        .assert()
        .success()
        .stdout(predicate::str::contains("גל מזרחי"));
}

#[test]
fn test_query_is_case_insensitive_on_latin() {
    let env = TestEnv::new();
    let data_path = env.temp_dir.path().join("latin.json");
    fs::write(
        &data_path,
        r#"[{"firstName":"Dana","lastName":"Cohen","pluga":"A","framework":"HQ"}]"#,
    )
    .unwrap();

    dafkesher_cmd()
        .args(["--data", data_path.to_str().unwrap(), "query", "COHEN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana Cohen"));
}

#[test]
fn test_query_no_matches() {
    let env = TestEnv::new();

    env.dafkesher()
        .args(["query", "אין כזה שם"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches for"));
}

#[test]
fn test_query_does_not_match_phone_links_by_default() {
    let env = TestEnv::new();

    env.dafkesher()
        .args(["query", "+972501234567"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches for"));
}

#[test]
fn test_query_matches_phone_links_when_configured() {
    let env = TestEnv::new();
    let config_path = env.temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "data_path = {:?}\nsearch_includes_phone_links = true\n",
            env.data_path.to_str().unwrap()
        ),
    )
    .unwrap();

    dafkesher_cmd()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "query",
            "+972501234567",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("דנה כהן"));
}

#[test]
fn test_missing_data_file_names_the_file() {
    let env = TestEnv::new();

    dafkesher_cmd()
        .args([
            "--data",
            env.temp_dir.path().join("missing.json").to_str().unwrap(),
            "query",
            "דנה",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("שגיאה בטעינת הנתונים"))
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_malformed_data_file_fails() {
    let env = TestEnv::new();
    let data_path = env.temp_dir.path().join("broken.json");
    fs::write(&data_path, "{ not json").unwrap();

    dafkesher_cmd()
        .args(["--data", data_path.to_str().unwrap(), "query", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.json"));
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_writes_vcard_file() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "א",
            "--subgroup",
            "חוד",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 contact(s)"));

    let files = env.exported_vcf_files();
    assert_eq!(files.len(), 1);

    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Pluga_א_חוד_"), "unexpected filename {}", name);

    let content = fs::read_to_string(&files[0]).unwrap();
    assert_eq!(content.matches("BEGIN:VCARD").count(), 2);
    assert!(content.contains("N:כהן;דנה;;;"));
    assert!(content.contains("FN:דנה כהן"));
    assert!(content.contains("TEL;TYPE=cell:+972501234567"));
    assert!(content.contains("NOTE:פלוגה: א | מסגרת: חוד | תפקיד: מפקדת"));
    assert!(content.contains("END:VCARD\nBEGIN:VCARD"));
}

#[test]
fn test_export_sorted_subset_only() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "א",
            "--subgroup",
            "עורף",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 contact(s)"));

    let files = env.exported_vcf_files();
    let content = fs::read_to_string(&files[0]).unwrap();
    assert!(content.contains("FN:גל מזרחי"));
    assert!(!content.contains("דנה"));
    // this record has no E.164 number, so no TEL line
    assert!(!content.contains("TEL"));
}

#[test]
fn test_export_requires_matching_selection() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "ב",
            "--subgroup",
            "חוד",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no records match"));

    assert!(env.exported_vcf_files().is_empty());
}

#[test]
fn test_export_filename_is_sanitized() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "צוות/מיוחד",
            "--subgroup",
            "חוד",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let files = env.exported_vcf_files();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.contains("צוות_מיוחד"), "unexpected filename {}", name);
}

#[test]
fn test_export_with_query_narrows_batch() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "א",
            "--subgroup",
            "חוד",
            "--query",
            "סמל",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 contact(s)"));

    let content = fs::read_to_string(&env.exported_vcf_files()[0]).unwrap();
    assert!(content.contains("FN:אבי לוי"));
}

#[test]
fn test_export_leaves_no_temp_file() {
    let env = TestEnv::new();

    env.dafkesher()
        .args([
            "export",
            "--group",
            "א",
            "--subgroup",
            "חוד",
            "--out",
            env.export_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let leftovers: Vec<_> = fs::read_dir(&env.export_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
