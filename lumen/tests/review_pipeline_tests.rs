use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const LEGACY_STANDARDS: &str = r#"{
    "DAX_Templates": {
        "source": "external/DAX_Templates/Standards/02_DAX_Standards_and_Naming.md",
        "naming": {
            "measures": "snake_case",
            "columns": "PascalCase",
            "folders": ["Sales KPIs", "_Final"]
        },
        "coding": {
            "division": "Use DIVIDE() instead of the raw division operator."
        },
        "anti_patterns": ["Giant measures without VAR"]
    }
}"#;

const SALES_MODEL: &str = r#"{
    "model": {
        "tables": [
            {
                "name": "Sales",
                "measures": [
                    {
                        "name": "TotalSales",
                        "expression": "[Amount]/[Count]"
                    }
                ],
                "columns": [
                    {"name": "customer id"}
                ]
            }
        ]
    }
}"#;

/// Scratch workspace with the legacy standards and an input model in place.
struct LumenTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl LumenTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();

        std::fs::create_dir_all(root.join("external"))?;
        std::fs::write(root.join("external/standards_mcp.json"), LEGACY_STANDARDS)?;

        std::fs::create_dir_all(root.join("input"))?;
        std::fs::write(root.join("input/sales.json"), SALES_MODEL)?;

        Ok(Self { _tmp: tmp, root })
    }

    fn lumen(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lumen"));
        cmd.current_dir(&self.root);
        cmd
    }

    fn find_artifact(&self, name: &str) -> Option<PathBuf> {
        let reviews = self.root.join("pbip_artifacts/reviews");
        walkdir::WalkDir::new(reviews)
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| entry.file_name().to_string_lossy() == name)
            .map(|entry| entry.into_path())
    }
}

#[test]
fn test_sync_writes_catalog_then_check_passes() -> Result<()> {
    let env = LumenTestEnv::new()?;

    env.lumen()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"synced\""));

    assert!(env.root.join("external/standards_catalog.json").is_file());

    env.lumen()
        .args(["sync", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"ok\""));
    Ok(())
}

#[test]
fn test_sync_check_reports_missing_catalog() -> Result<()> {
    let env = LumenTestEnv::new()?;

    env.lumen()
        .args(["sync", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog_missing"));
    Ok(())
}

#[test]
fn test_sync_check_reports_outdated_catalog() -> Result<()> {
    let env = LumenTestEnv::new()?;
    env.lumen().arg("sync").assert().success();

    let updated = LEGACY_STANDARDS.replace("Sales KPIs", "Finance KPIs");
    std::fs::write(env.root.join("external/standards_mcp.json"), updated)?;

    env.lumen()
        .args(["sync", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog_outdated"));
    Ok(())
}

#[test]
fn test_review_produces_standards_artifacts() -> Result<()> {
    let env = LumenTestEnv::new()?;
    env.lumen().arg("sync").assert().success();

    env.lumen()
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"completed\""));

    let standards = env
        .find_artifact("standards.json")
        .expect("standards.json not written");
    let content = std::fs::read_to_string(&standards)?;
    let validation: serde_json::Value = serde_json::from_str(&content)?;

    assert_eq!(validation["status"], "issues_found");
    let issues = validation["issues"].as_array().unwrap();
    assert!(issues
        .iter()
        .any(|i| i["rule_id"] == "dax.naming.measure.snake_case"));
    assert!(issues.iter().any(|i| i["rule_id"] == "dax.coding.division"));

    // The measure rename must land in the patch file.
    let patch = env
        .find_artifact("recommended_renames.tmdl")
        .expect("patch not written");
    let patch_text = std::fs::read_to_string(patch)?;
    assert!(patch_text
        .contains("ALTER MEASURE 'Sales'[TotalSales] RENAME TO [total_sales];"));

    // Review directory is prefixed with the classified domain.
    let review_dir = standards.parent().unwrap();
    assert!(dir_name(review_dir).starts_with("sales__sales_"));
    Ok(())
}

#[test]
fn test_review_dry_run_keeps_session_logging_only() -> Result<()> {
    let env = LumenTestEnv::new()?;
    env.lumen().arg("sync").assert().success();

    env.lumen()
        .args(["review", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dry_run\":true"));

    assert!(env.find_artifact("summary.json").is_some());
    assert!(env.find_artifact("session_history.json").is_some());
    assert!(env.find_artifact("audit.json").is_some());
    assert!(env.find_artifact("standards.json").is_none());
    assert!(env.find_artifact("recommended_renames.tmdl").is_none());
    Ok(())
}

#[test]
fn test_review_without_sources_reports_no_sources() -> Result<()> {
    let env = LumenTestEnv::new()?;
    std::fs::remove_file(env.root.join("input/sales.json"))?;

    env.lumen()
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"no_sources\""));
    Ok(())
}

#[test]
fn test_review_works_without_synced_catalog() -> Result<()> {
    // No `sync` first: the review falls back to building from the legacy
    // config directly.
    let env = LumenTestEnv::new()?;

    env.lumen()
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\":1"));
    Ok(())
}

#[test]
fn test_rules_lists_catalog_entries() -> Result<()> {
    let env = LumenTestEnv::new()?;
    env.lumen().arg("sync").assert().success();

    env.lumen()
        .arg("rules")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("dax.naming.measure.snake_case")
                .and(predicate::str::contains("dax.coding.division")),
        );
    Ok(())
}

#[test]
fn test_unparseable_model_is_skipped_not_fatal() -> Result<()> {
    let env = LumenTestEnv::new()?;
    std::fs::write(env.root.join("input/broken.json"), "{not json")?;

    env.lumen()
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\":2"));

    // The broken artifact still gets a summary, with a skipped validation.
    let reviews = env.root.join("pbip_artifacts/reviews");
    let skipped = walkdir::WalkDir::new(reviews)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy() == "summary.json")
        .map(|e| std::fs::read_to_string(e.path()).unwrap_or_default())
        .filter_map(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
        .any(|summary| summary["status"] == "skipped");
    assert!(skipped);
    Ok(())
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
