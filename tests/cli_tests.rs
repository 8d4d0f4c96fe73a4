// CLI integration tests: rank, classify and anova end to end through the binary

mod utils;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn effrank() -> Command {
    Command::cargo_bin("effrank").unwrap()
}

// ============================================================================
// rank
// ============================================================================

#[test]
fn test_rank_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let study = utils::write_kpr_study(dir.path(), 2.0);
    let out = dir.path().join("out");

    effrank()
        .arg("rank")
        .arg("--study")
        .arg(&study)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "For kpr (2nd) and axis value 50 the slow efficiency ranks are:",
        ))
        .stderr(predicate::str::contains("Wrote"));

    for name in [
        "ranks_stats_kpr-2nd.csv",
        "ranks_stats_kpr-3rd.csv",
        "kpr-2ndslow.csv",
        "kpr-2ndfast.csv",
        "rank_stats.csv",
        "zscores_controllers-slow.csv",
        "zscores_controllers-fast.csv",
        "AvgZscores_controllers.txt",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    let retained = fs::read_to_string(out.join("kpr-2ndslow.csv")).unwrap();
    assert_eq!(retained, "controller,method\nMRIHTol-I,ERK22a\n");

    let combined = fs::read_to_string(out.join("rank_stats.csv")).unwrap();
    assert!(combined.starts_with("problem,method,controller,order,axis_param,metric,average_rank\n"));
    // 6 second-order + 3 third-order configurations, 4 orderings each
    assert_eq!(combined.lines().count(), 1 + 9 * 4);

    let summary = fs::read_to_string(out.join("AvgZscores_controllers.txt")).unwrap();
    assert!(summary.starts_with(&"*".repeat(94)));
    assert!(summary.contains(&format!("{:50} | Average z-score", "Controller")));
    assert!(summary.contains("MRIHTol-I"));
    assert!(!summary.contains("MRIPI"));
}

#[test]
fn test_rank_json_output() {
    let dir = TempDir::new().unwrap();
    let study = utils::write_kpr_study(dir.path(), 2.0);

    let output = effrank()
        .arg("rank")
        .arg("--study")
        .arg(&study)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["format"], "effrank-json-v1");
    assert_eq!(json["summary"]["units"], 2);
    assert_eq!(json["summary"]["rank_records"], 36);
    assert_eq!(json["units"][0]["problem"], "kpr");
    assert_eq!(
        json["units"][0]["retained"][1]["pairs"][0]["controller"],
        "MRIHTol-I"
    );
}

#[test]
fn test_rank_csv_output() {
    let dir = TempDir::new().unwrap();
    let study = utils::write_kpr_study(dir.path(), 12.0);

    effrank()
        .arg("rank")
        .arg("--study")
        .arg(&study)
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "problem,method,controller,order,axis_param,metric,average_rank",
        ))
        .stdout(predicate::str::contains("kpr,ERK33a,MRIHTol-I,3,50.0,slow,1"));
}

#[test]
fn test_rank_missing_axis_value_fails() {
    let dir = TempDir::new().unwrap();
    utils::write(dir.path(), "kpr.csv", &utils::long_csv(&utils::KPR_COSTS));
    let study = utils::write(
        dir.path(),
        "study.toml",
        &utils::kpr_study(12.0).replace("[50.0, 500.0]", "[50.0, 5000.0]"),
    );

    effrank()
        .arg("rank")
        .arg("--study")
        .arg(&study)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing data"))
        .stderr(predicate::str::contains("axis=5000"));
}

#[test]
fn test_rank_missing_study_file() {
    effrank()
        .arg("rank")
        .arg("--study")
        .arg("/nonexistent/study.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read study file"));
}

#[test]
fn test_rank_debug_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let study = utils::write_kpr_study(dir.path(), 2.0);

    effrank()
        .arg("--debug")
        .arg("rank")
        .arg("--study")
        .arg(&study)
        .assert()
        .success()
        .stderr(predicate::str::contains("retained"));
}

// ============================================================================
// classify / anova
// ============================================================================

fn write_rank_table(dir: &TempDir) -> std::path::PathBuf {
    utils::write(
        dir.path(),
        "rank_stats.csv",
        "\
method,controller,order,axis_param,metric,average_rank
ERK22a,MRIHTol-I,2,50,slow,1.0
ERK22b,MRIHTol-I,2,50,slow,1.5
ERK22a,MRIDec-I,2,50,slow,3.0
ERK22b,MRIDec-I,2,50,slow,3.5
ERK22a,MRIPI,2,50,slow,8.0
ERK22a,MRIHTol-I,2,50,fast,2.0
ERK22a,MRIDec-I,2,50,fast,2.0
",
    )
}

#[test]
fn test_classify_text_report() {
    let dir = TempDir::new().unwrap();
    let ranks = write_rank_table(&dir);

    effrank()
        .arg("classify")
        .arg("--ranks")
        .arg(&ranks)
        .arg("--group-by")
        .arg("controller")
        .arg("--metric")
        .arg("slow")
        .assert()
        .success()
        .stdout(predicate::str::contains("MRIPI"))
        .stdout(predicate::str::contains("worse"));
}

#[test]
fn test_classify_writes_csv() {
    let dir = TempDir::new().unwrap();
    let ranks = write_rank_table(&dir);
    let out = dir.path().join("z.csv");

    effrank()
        .arg("classify")
        .arg("--ranks")
        .arg(&ranks)
        .arg("--group-by")
        .arg("family")
        .arg("--metric")
        .arg("slow")
        .arg("--exclude-controller")
        .arg("MRIPI")
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("metric,order,axis_param,method,controller,average_rank,z_score,status\n"));
    assert_eq!(text.lines().count(), 1 + 4);
    assert!(!text.contains("MRIPI"));
}

#[test]
fn test_classify_degenerate_slice_fails() {
    let dir = TempDir::new().unwrap();
    let ranks = write_rank_table(&dir);

    effrank()
        .arg("classify")
        .arg("--ranks")
        .arg(&ranks)
        .arg("--group-by")
        .arg("controller")
        .arg("--metric")
        .arg("fast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate distribution"));
}

#[test]
fn test_classify_empty_slice_fails() {
    let dir = TempDir::new().unwrap();
    let ranks = write_rank_table(&dir);

    effrank()
        .arg("classify")
        .arg("--ranks")
        .arg(&ranks)
        .arg("--group-by")
        .arg("controller")
        .arg("--metric")
        .arg("energy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_anova_json() {
    let dir = TempDir::new().unwrap();
    let ranks = write_rank_table(&dir);

    let output = effrank()
        .arg("anova")
        .arg("--ranks")
        .arg(&ranks)
        .arg("--group-by")
        .arg("controller")
        .arg("--metric")
        .arg("slow")
        .arg("--exclude-controller")
        .arg("MRIPI")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["df_between"], 1);
    assert_eq!(json["df_within"], 2);
}

#[test]
fn test_help_lists_subcommands() {
    effrank()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rank"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("anova"));
}
