// lumen/src/main.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

// Infrastructure (Catalog & Profiles)
use lumen_core::infrastructure::catalog_store::{CatalogStore, SyncStatus};
use lumen_core::infrastructure::profiles::FsProfileSource;

// Application (Use Cases)
use lumen_core::application::ReviewPipeline;

// Domain (for the rules table)
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "BI semantic-model standards inspector", long_about = None)]
#[command(version)]
struct Cli {
    /// Canonical standards catalog file
    #[arg(long, global = true, default_value = "external/standards_catalog.json")]
    catalog: PathBuf,

    /// Legacy standards configuration the catalog is generated from
    #[arg(long, global = true, default_value = "external/standards_mcp.json")]
    legacy: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 🔍 Reviews PBIP artifacts against the standards catalog
    Review {
        /// PBIP files or directories to process (defaults to ./input)
        targets: Vec<PathBuf>,

        /// Directory where review artifacts are written
        #[arg(long, default_value = "pbip_artifacts/reviews")]
        artifacts_dir: PathBuf,

        /// Directory holding per-domain profile metadata
        #[arg(long, default_value = "profiles")]
        profiles_dir: PathBuf,

        /// Skip artifact generation, keep session logging only
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 🔄 Regenerates the canonical catalog from the legacy standards
    Sync {
        /// Validate that the existing catalog matches the generated output
        #[arg(long, default_value = "false")]
        check: bool,
    },

    /// 📚 Lists the rules in the loaded catalog
    Rules {
        /// Only show rules for one resource (e.g. "DAX", "PowerQuery")
        #[arg(long)]
        resource: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug lumen review ... for details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = CatalogStore::new(cli.catalog.clone(), cli.legacy.clone());

    match cli.command {
        // --- USE CASE: REVIEW PIPELINE ---
        Commands::Review {
            targets,
            artifacts_dir,
            profiles_dir,
            dry_run,
        } => {
            let start = std::time::Instant::now();

            let catalog = Arc::new(store.load_catalog()?);
            println!("⚙️  Catalog loaded ({} rules)", catalog.rule_count);

            let targets = if targets.is_empty() {
                vec![PathBuf::from("input")]
            } else {
                targets
            };

            let profiles = Arc::new(FsProfileSource::new(profiles_dir));
            let pipeline = ReviewPipeline::new(catalog, profiles, artifacts_dir, dry_run);

            let report = pipeline.run(&targets).await?;
            println!("{}", serde_json::to_string(&report)?);

            if !report.errors.is_empty() {
                eprintln!("\n❌ FAILURE. {} source(s) failed.", report.errors.len());
                std::process::exit(1);
            }
            println!("✨ Done in {:.2?}", start.elapsed());
        }

        // --- USE CASE: CATALOG SYNC ---
        Commands::Sync { check } => {
            if check {
                match store.check_sync()? {
                    SyncStatus::InSync { rules } => {
                        println!(
                            "{}",
                            serde_json::json!({
                                "status": "ok",
                                "catalog": catalog_name(&cli.catalog),
                                "rules": rules,
                            })
                        );
                    }
                    status => {
                        let reason = status.reason().unwrap_or("unknown");
                        eprintln!(
                            "{}",
                            serde_json::json!({
                                "status": "error",
                                "reason": reason,
                                "message": sync_failure_message(&status, &cli.catalog),
                            })
                        );
                        std::process::exit(1);
                    }
                }
            } else {
                let catalog = store.sync()?;
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "synced",
                        "catalog": catalog_name(&cli.catalog),
                        "rules": catalog.rule_count,
                    })
                );
            }
        }

        // --- USE CASE: RULES LISTING ---
        Commands::Rules { resource } => {
            let catalog = store.load_catalog()?;

            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec![
                "ID",
                "Scope",
                "Category",
                "Severity",
                "Title",
            ]);

            let mut shown = 0;
            for rule in catalog.iter_by_resource(resource.as_deref()) {
                table.add_row(vec![
                    rule.id.as_str(),
                    rule.scope.as_str(),
                    rule.category.as_str(),
                    rule.severity.as_str(),
                    rule.title.as_str(),
                ]);
                shown += 1;
            }

            println!("{table}");
            println!("📚 {shown} rule(s) ({} in catalog)", catalog.rule_count);
        }
    }

    Ok(())
}

fn catalog_name(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn sync_failure_message(status: &SyncStatus, catalog: &PathBuf) -> String {
    match status {
        SyncStatus::CatalogMissing => {
            format!("{} is not present", catalog.display())
        }
        SyncStatus::CatalogOutdated => format!(
            "{} is not in sync; run without --check and commit the changes.",
            catalog.display()
        ),
        SyncStatus::InSync { .. } => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_review_defaults() {
        let args = Cli::parse_from(["lumen", "review"]);
        match args.command {
            Commands::Review {
                targets,
                artifacts_dir,
                dry_run,
                ..
            } => {
                assert!(targets.is_empty());
                assert_eq!(
                    artifacts_dir.to_string_lossy(),
                    "pbip_artifacts/reviews"
                );
                assert!(!dry_run);
            }
            _ => panic!("Expected Review command"),
        }
    }

    #[test]
    fn test_cli_parse_review_targets_and_dry_run() {
        let args = Cli::parse_from(["lumen", "review", "a.pbip", "b.json", "--dry-run"]);
        match args.command {
            Commands::Review {
                targets, dry_run, ..
            } => {
                assert_eq!(targets.len(), 2);
                assert!(dry_run);
            }
            _ => panic!("Expected Review command"),
        }
    }

    #[test]
    fn test_cli_parse_sync_check() {
        let args = Cli::parse_from(["lumen", "sync", "--check"]);
        match args.command {
            Commands::Sync { check } => assert!(check),
            _ => panic!("Expected Sync command"),
        }
    }

    #[test]
    fn test_cli_parse_global_catalog_override() {
        let args = Cli::parse_from(["lumen", "rules", "--catalog", "/tmp/catalog.json"]);
        assert_eq!(args.catalog.to_string_lossy(), "/tmp/catalog.json");
        match args.command {
            Commands::Rules { resource } => assert_eq!(resource, None),
            _ => panic!("Expected Rules command"),
        }
    }
}
