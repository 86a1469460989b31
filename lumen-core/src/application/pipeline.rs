// lumen-core/src/application/pipeline.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::application::session::{HistoryEntry, SessionManager};
use crate::domain::classify::{classify, Classification};
use crate::domain::model::{ModelStructure, StructureSummary};
use crate::domain::ports::ProfileSource;
use crate::domain::standards::{render_patch, RuleCatalog, StandardsValidator, ValidationResult, ValidationStatus};
use crate::error::LumenError;
use crate::infrastructure::discovery::discover_sources;
use crate::infrastructure::extract::{load_metadata_for_source, load_model_structure};
use crate::infrastructure::fs;

const PIPELINE_STEPS: [(&str, &str); 4] = [
    ("ingest", "Collected PBIP project structure"),
    ("classify", "Detected report domain and intent"),
    ("standards", "Checked naming and formatting standards"),
    ("report", "Generated summary report"),
];

const PIPELINE_USER: &str = "lumen_cli";

// Bounded parallelism across artifacts; the catalog is shared read-only.
const MAX_CONCURRENT_SOURCES: usize = 8;

/// One pipeline step as it appears in the review envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub action: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Per-artifact review envelope, also persisted as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub status: ValidationStatus,
    pub source: String,
    pub session_id: String,
    pub classification: Classification,
    pub dry_run: bool,
    pub steps: Vec<StepResult>,
    pub structure_summary: StructureSummary,
    pub standards: ValidationResult,
    pub standards_issue_count: usize,
}

/// Whole-run outcome, printed by the CLI as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: String,
    pub processed: usize,
    pub dry_run: bool,
    pub sources: Vec<String>,
    pub errors: Vec<String>,
}

/// Orchestrates the `ingest → classify → standards → report` sequence for
/// every discovered artifact. Steps are best-effort: a skipped validation or
/// a failed source never aborts the remaining work.
#[derive(Clone)]
pub struct ReviewPipeline {
    catalog: Arc<RuleCatalog>,
    profiles: Arc<dyn ProfileSource + Send + Sync>,
    artifacts_root: PathBuf,
    dry_run: bool,
}

impl ReviewPipeline {
    pub fn new(
        catalog: Arc<RuleCatalog>,
        profiles: Arc<dyn ProfileSource + Send + Sync>,
        artifacts_root: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            catalog,
            profiles,
            artifacts_root,
            dry_run,
        }
    }

    pub async fn run(&self, targets: &[PathBuf]) -> Result<RunReport, LumenError> {
        let sources = discover_sources(targets);

        if sources.is_empty() {
            return Ok(RunReport {
                status: "no_sources".to_string(),
                processed: 0,
                dry_run: self.dry_run,
                sources: Vec::new(),
                errors: Vec::new(),
            });
        }

        println!("🔍 Reviewing {} source(s)...", sources.len());

        // run_source is blocking file work; spawn_blocking keeps the runtime
        // thread free while the pool runs up to MAX_CONCURRENT_SOURCES at once.
        let futures = sources.iter().map(|source| {
            let pipeline = self.clone();
            let source = source.clone();
            async move {
                let task = tokio::task::spawn_blocking({
                    let source = source.clone();
                    move || pipeline.run_source(&source)
                });
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => Err(LumenError::InternalError(join_err.to_string())),
                };
                (source, outcome)
            }
        });
        let stream = futures::stream::iter(futures).buffer_unordered(MAX_CONCURRENT_SOURCES);
        let mut results: Vec<_> = stream.collect().await;

        // Completion order is nondeterministic; report in discovery order.
        results.sort_by_key(|(source, _)| {
            sources.iter().position(|s| s == source).unwrap_or(usize::MAX)
        });

        let mut processed = Vec::new();
        let mut errors = Vec::new();
        for (source, outcome) in results {
            match outcome {
                Ok(summary) => {
                    println!(
                        "  ✅ {} ({} issue(s))",
                        summary.source, summary.standards_issue_count
                    );
                    processed.push(summary.source.clone());
                }
                Err(err) => {
                    eprintln!("  ❌ {}: {}", source.display(), err);
                    errors.push(format!("{}: {}", source.display(), err));
                }
            }
        }

        Ok(RunReport {
            status: "completed".to_string(),
            processed: processed.len(),
            dry_run: self.dry_run,
            sources: processed,
            errors,
        })
    }

    /// Reviews one source end to end and persists its artifact set.
    pub fn run_source(&self, source: &Path) -> Result<SourceSummary, LumenError> {
        let metadata = load_metadata_for_source(source);

        // Parse failures downgrade to an empty structure, which the
        // validator reports as a skipped result instead of an error.
        let structure = match load_model_structure(source) {
            Ok(structure) => structure,
            Err(err) => {
                warn!(source = %source.display(), reason = err.reason(), "structure extraction failed");
                ModelStructure::default()
            }
        };

        let stem = file_stem(source);
        let classification = classify(&stem, &metadata, &structure, self.profiles.as_ref());

        let mut manager = SessionManager::new();
        let mut context = Map::new();
        context.insert("source".into(), Value::String(source.display().to_string()));
        context.insert("domain".into(), Value::String(classification.domain.clone()));
        context.insert("intent".into(), Value::String(classification.intent.clone()));
        let session_id = manager.start_session(PIPELINE_USER, context);

        let artifacts_dir = self.artifact_dir(source, &classification);
        std::fs::create_dir_all(&artifacts_dir).map_err(LumenError::from)?;

        let mut steps = Vec::new();
        let mut standards: Option<ValidationResult> = None;

        for (action, description) in PIPELINE_STEPS {
            let payload = serde_json::json!({
                "source": file_name(source),
                "description": description,
                "domain": classification.domain,
            });
            let entry = manager.process_session(&session_id, action, PIPELINE_USER, Some(payload))?;

            let mut step = StepResult {
                action: action.to_string(),
                status: entry.status.clone(),
                timestamp: entry.timestamp,
                description: description.to_string(),
                validation: None,
            };

            if action == "standards" {
                let validator = StandardsValidator::new(&self.catalog);
                let validation =
                    validator.validate(&source.display().to_string(), &structure);

                if !self.dry_run {
                    fs::write_json(&artifacts_dir.join("standards.json"), &validation)?;
                    let patch = render_patch(&validation.auto_fixes);
                    if !patch.is_empty() {
                        fs::atomic_write(artifacts_dir.join("recommended_renames.tmdl"), patch)?;
                    }
                }

                step.validation = Some(validation.clone());
                standards = Some(validation);
            }

            if action == "report" && !self.dry_run {
                let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
                let report = serde_json::json!({
                    "source": source.display().to_string(),
                    "domain": classification.domain,
                    "intent": classification.intent,
                    "generated_at": generated_at,
                    "notes": "Stub report generated by the review pipeline",
                });
                fs::write_json(&artifacts_dir.join(format!("{stem}_report.json")), &report)?;
            }

            steps.push(step);
        }

        manager.close_session(&session_id, PIPELINE_USER)?;

        let standards = standards.unwrap_or_else(|| {
            ValidationResult::skipped(
                &source.display().to_string(),
                "Standards step did not run.",
            )
        });

        let summary = SourceSummary {
            status: standards.status,
            source: source.display().to_string(),
            session_id: session_id.clone(),
            classification,
            dry_run: self.dry_run,
            steps,
            structure_summary: structure.summary(),
            standards_issue_count: standards.issue_count,
            standards,
        };

        self.persist_session_artifacts(&artifacts_dir, &manager, &session_id, &summary)?;

        Ok(summary)
    }

    /// Session bookkeeping is written even on dry runs: the run itself is
    /// part of the audit record.
    fn persist_session_artifacts(
        &self,
        artifacts_dir: &Path,
        manager: &SessionManager,
        session_id: &str,
        summary: &SourceSummary,
    ) -> Result<(), LumenError> {
        let history: &[HistoryEntry] = manager.history(session_id)?;
        fs::write_json(
            &artifacts_dir.join("session_history.json"),
            &serde_json::json!({ "history": history }),
        )?;
        fs::write_json(
            &artifacts_dir.join("audit.json"),
            &serde_json::json!({ "audit": manager.audit().session_records(session_id) }),
        )?;
        fs::write_json(&artifacts_dir.join("summary.json"), summary)?;
        Ok(())
    }

    /// `{domain}__{stem}_{hash8}`, plain `{stem}_{hash8}` for generic
    /// artifacts. The hash pins the directory to the resolved source path so
    /// re-runs overwrite their own artifacts.
    fn artifact_dir(&self, source: &Path, classification: &Classification) -> PathBuf {
        let resolved = source
            .canonicalize()
            .unwrap_or_else(|_| source.to_path_buf());
        let digest = Sha256::digest(resolved.display().to_string().as_bytes());
        let short = &hex::encode(digest)[..8];

        let stem = file_stem(source);
        let name = if classification.domain == "generic" {
            format!("{stem}_{short}")
        } else {
            format!("{}__{stem}_{short}", classification.domain)
        };
        self.artifacts_root.join(name)
    }
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string())
}

fn file_name(source: &Path) -> String {
    source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}
