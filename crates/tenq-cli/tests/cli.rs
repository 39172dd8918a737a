#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn tenq(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tenq").unwrap();
    cmd.current_dir(root)
        .env_remove("TENQ_CONFIG")
        .env_remove("TENQ_OUTPUT_DIR")
        .env_remove("TENQ_CACHE_DIR")
        .env("RUST_LOG", "error");
    cmd
}

fn write_report(root: &Path, company: &str, date: &str, kind: &str, body: &str) {
    let dir = root.join("output").join(company).join(date);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{kind}_{date}.json")), body).unwrap();
}

#[test]
fn version_prints_package_version() {
    let dir = tempdir().unwrap();
    tenq(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn filings_lists_matching_cache_entries() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    fs::create_dir_all(&cache).unwrap();
    for name in [
        "ACME Corp_10-Q_2024-06-30.json",
        "ACME Corp_10-Q_2024-03-31.json",
        "Globex_10-Q_2024-06-30.json",
    ] {
        fs::write(cache.join(name), "{}").unwrap();
    }

    tenq(dir.path())
        .args(["filings", "acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1: ACME Corp_10-Q_2024-03-31.json\n2: ACME Corp_10-Q_2024-06-30.json",
        ))
        .stdout(predicate::str::contains("Globex").not());
}

#[test]
fn filings_without_match_exits_not_found() {
    let dir = tempdir().unwrap();
    tenq(dir.path())
        .args(["filings", "nothing", "--cache-dir", "missing-cache"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No cached filings match 'nothing'"));
}

#[test]
fn reports_prints_stored_reports_for_a_date() {
    let dir = tempdir().unwrap();
    write_report(dir.path(), "ACME", "2024-06-30", "revenue", "{\"q\": \"q2\"}");
    write_report(dir.path(), "ACME", "2024-03-31", "debt", "{\"q\": \"q1\"}");

    tenq(dir.path())
        .args(["reports", "ACME", "--date", "2024-06-30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revenue_2024-06-30.json"))
        .stdout(predicate::str::contains("{\"q\": \"q2\"}"))
        .stdout(predicate::str::contains("debt_2024-03-31.json").not());

    tenq(dir.path())
        .args(["reports", "ACME"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debt_2024-03-31.json"));
}

#[test]
fn output_dir_flag_overrides_default() {
    let dir = tempdir().unwrap();
    let custom = dir.path().join("elsewhere").join("Globex").join("2024-06-30");
    fs::create_dir_all(&custom).unwrap();
    fs::write(custom.join("cashflow_2024-06-30.json"), "{}").unwrap();

    tenq(dir.path())
        .args(["--output-dir", "elsewhere", "reports", "Globex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cashflow_2024-06-30.json"));
}

#[test]
fn unreadable_config_is_internal_error() {
    let dir = tempdir().unwrap();
    tenq(dir.path())
        .args(["--config", "does-not-exist.yaml", "filings"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.yaml"));
}

#[test]
fn run_without_a_terminal_stops_on_closed_input() {
    let dir = tempdir().unwrap();
    tenq(dir.path())
        .args(["run", "--once"])
        .env("OPENAI_API_KEY", "sk-test")
        .env("GOOGLE_API_KEY", "g-test")
        .env("TENQ_EDGAR_IDENTITY", "Jane Doe jane@example.com")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("operator input unavailable"));
}

#[test]
fn reports_rejects_a_date_outside_the_tree() {
    let dir = tempdir().unwrap();
    write_report(dir.path(), "ACME", "2024-06-30", "revenue", "{}");
    fs::write(dir.path().join("leak.json"), "{\"secret\": true}").unwrap();

    tenq(dir.path())
        .args(["reports", "ACME", "--date", "../.."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid filing date"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn unreadable_report_tree_is_a_store_error() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("output");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("ACME"), "not a directory").unwrap();

    tenq(dir.path())
        .args(["reports", "ACME"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("store error"));
}
