//! CLI binary smoke tests using assert_cmd.
//!
//! These tests run the compiled `payment-predictor` binary to check
//! argument parsing, help text, templates and error handling end-to-end.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("payment-predictor").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("prep"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict-all"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("payment-predictor"));
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[test]
fn train_no_config_prints_template() {
    cmd()
        .arg("train")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"features_file\""))
        .stdout(predicate::str::contains("\"test_size\""))
        .stderr(predicate::str::contains("No config file provided"));
}

#[test]
fn predict_all_no_config_prints_template() {
    cmd()
        .arg("predict-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"report_interval\""))
        .stdout(predicate::str::contains("\"scaler_file\""));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/config.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn predict_requires_numeric_acctrefno() {
    cmd()
        .args(["predict", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn prep_rejects_non_csv_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    std::fs::write(&path, "x").unwrap();
    cmd()
        .args(["prep", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".csv extension"));
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

fn write_raw_log(path: &std::path::Path, single_payment_account: Option<i64>) {
    let mut text = String::from(
        "acctrefno,payment_number,transaction_code,date_due,transaction_date,transaction_description,segment\n",
    );
    let mut push_row = |acct: i64, pn: u32, code: i64, desc: &str, paid_day: u32| {
        text.push_str(&format!(
            "{},{},{},2021-{:02}-10,2021-{:02}-{:02},{},{}\n",
            acct,
            pn,
            code,
            pn,
            pn,
            paid_day,
            desc,
            if acct % 2 == 0 { "commercial" } else { "retail" }
        ));
    };
    let codes = [(204, "P+I Principal Payment"), (206, "P+I Interest Payment")];
    for acct in 1..=4 {
        for pn in 1..=6 {
            let paid_day = if acct % 2 == 0 { 5 } else { 20 };
            for (code, desc) in codes {
                push_row(acct, pn, code, desc, paid_day);
            }
        }
    }
    if let Some(acct) = single_payment_account {
        for (code, desc) in codes {
            push_row(acct, 1, code, desc, 5);
        }
    }
    std::fs::write(path, text).unwrap();
}

/// Prep and train on `raw`, returning the path of a prediction config.
fn prepare_and_train(root: &std::path::Path, raw: &std::path::Path) -> std::path::PathBuf {
    let prepared = root.join("prepared");
    cmd()
        .args(["prep", raw.to_str().unwrap(), "-o", prepared.to_str().unwrap()])
        .assert()
        .success();
    assert!(prepared.join("features.csv").exists());

    let model_dir = root.join("model");
    let train_cfg = root.join("train.json");
    std::fs::write(
        &train_cfg,
        serde_json::json!({
            "features_file": prepared.join("features.csv"),
            "target_file": prepared.join("target.csv"),
            "output_dir": model_dir,
        })
        .to_string(),
    )
    .unwrap();
    cmd().args(["train", train_cfg.to_str().unwrap()]).assert().success();
    assert!(model_dir.join("model.json").exists());
    assert!(model_dir.join("scaler.json").exists());

    let predict_cfg = root.join("predict.json");
    std::fs::write(
        &predict_cfg,
        serde_json::json!({
            "transactions_file": prepared.join("clean.csv"),
            "features_file": prepared.join("features.csv"),
            "target_file": prepared.join("target.csv"),
            "model_file": model_dir.join("model.json"),
            "scaler_file": model_dir.join("scaler.json"),
            "output_dir": root.join("predictions"),
        })
        .to_string(),
    )
    .unwrap();
    predict_cfg
}

#[test]
fn prep_train_predict_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let raw = root.join("raw.csv");
    write_raw_log(&raw, None);
    let predict_cfg = prepare_and_train(root, &raw);

    cmd()
        .args(["predict", "3", predict_cfg.to_str().unwrap()])
        .assert()
        .success();
    cmd()
        .args(["predict-all", predict_cfg.to_str().unwrap(), "--parallel"])
        .assert()
        .success();

    let out_dir = root.join("predictions");
    let folders: Vec<String> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(folders.iter().any(|f| f.starts_with("Individual")));
    let full = folders.iter().find(|f| f.starts_with("Full")).unwrap();

    let results = std::fs::read_to_string(out_dir.join(full).join("all_results.csv")).unwrap();
    assert_eq!(results.lines().count(), 5);
}

#[test]
fn predict_all_reports_progress_with_error_count() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let raw = root.join("raw.csv");
    write_raw_log(&raw, Some(9));
    let predict_cfg = prepare_and_train(root, &raw);

    cmd()
        .args([
            "predict-all",
            predict_cfg.to_str().unwrap(),
            "--report-interval",
            "1",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("completed 5/5"))
        .stderr(predicate::str::contains("errors encountered = 1"));
}
