// lumen-core/src/domain/classify.rs

use crate::domain::model::ModelStructure;
use crate::domain::ports::ProfileSource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Free-form artifact metadata (sidecar JSON next to the source).
pub type Metadata = Map<String, Value>;

/// Resolved classification for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// A known domain, "multi-domain" on near-ties, or "generic".
    pub domain: String,
    pub intent: String,
    pub metadata: Metadata,
    pub domain_candidates: Vec<(String, i64)>,
    pub profile_loaded: bool,
}

pub const MULTI_DOMAIN: &str = "multi-domain";
pub const GENERIC_DOMAIN: &str = "generic";

// Scoring weights. The 1-point tie margin below is calibrated against these
// exact constants; do not tune one without the other.
const WEIGHT_METADATA_DOMAIN: i64 = 2;
const WEIGHT_TABLE_DOMAIN: i64 = 3;
const WEIGHT_COLUMN_DOMAIN: i64 = 2;
const WEIGHT_SOURCE_DOMAIN: i64 = 2;
const WEIGHT_KEYWORD: i64 = 1;
const TIE_MARGIN: i64 = 1;

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "sales",
        &["sales", "revenue", "margin", "customer", "crm", "pipeline", "quote", "deal"],
    ),
    (
        "finance",
        &["finance", "financial", "ledger", "pnl", "balance", "cash", "gl", "account"],
    ),
    (
        "supply_chain",
        &["inventory", "warehouse", "logistics", "supply", "demand", "shipment", "stock"],
    ),
    (
        "marketing",
        &["campaign", "marketing", "lead", "click", "impression", "conversion"],
    ),
    ("hr", &["hr", "employee", "headcount", "attrition", "payroll", "recruit"]),
];

const METADATA_SIGNAL_KEYS: &[&str] = &[
    "domain",
    "business_domain",
    "domains",
    "tags",
    "topics",
    "business_units",
];

/// Scores candidate domains from metadata, model structure and the source
/// name, resolves near-ties to "multi-domain", and infers an intent label.
pub fn classify(
    source_stem: &str,
    metadata: &Metadata,
    structure: &ModelStructure,
    profiles: &dyn ProfileSource,
) -> Classification {
    let (domain, candidates) = determine_primary_domain(metadata, structure, source_stem);

    // Near-ties still pick the top candidate for the profile lookup.
    let profile_key = if domain == MULTI_DOMAIN {
        candidates.first().map(|(d, _)| d.as_str()).unwrap_or(GENERIC_DOMAIN)
    } else {
        domain.as_str()
    };

    let profile_meta = profiles.load(profile_key);
    let profile_loaded = profile_meta.is_some();
    let merged = enrich_metadata(metadata, profile_meta.unwrap_or_default());

    Classification {
        intent: infer_intent(metadata, structure),
        domain,
        metadata: merged,
        domain_candidates: candidates,
        profile_loaded,
    }
}

fn determine_primary_domain(
    metadata: &Metadata,
    structure: &ModelStructure,
    source_stem: &str,
) -> (String, Vec<(String, i64)>) {
    let mut scores: HashMap<&'static str, i64> = HashMap::new();
    score_metadata(metadata, &mut scores);
    score_structure(structure, &mut scores);
    score_text(&source_stem.to_lowercase(), WEIGHT_SOURCE_DOMAIN, &mut scores);

    if scores.is_empty() {
        return (GENERIC_DOMAIN.to_string(), Vec::new());
    }

    // Score descending, then name, so the candidate list is deterministic.
    let mut ranked: Vec<(String, i64)> = scores
        .into_iter()
        .map(|(domain, score)| (domain.to_string(), score))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top_score = ranked[0].1;
    let threshold = (top_score - TIE_MARGIN).max(1);
    let near_top = ranked.iter().filter(|(_, score)| *score >= threshold).count();
    if near_top > 1 {
        return (MULTI_DOMAIN.to_string(), ranked);
    }

    (ranked[0].0.clone(), ranked)
}

fn score_metadata(metadata: &Metadata, scores: &mut HashMap<&'static str, i64>) {
    let mut values: Vec<String> = Vec::new();
    for key in METADATA_SIGNAL_KEYS {
        match metadata.get(*key) {
            Some(Value::String(s)) => values.push(s.clone()),
            Some(Value::Array(items)) => {
                values.extend(items.iter().map(value_as_text));
            }
            _ => {}
        }
    }
    for value in values {
        score_text(&value.to_lowercase(), WEIGHT_METADATA_DOMAIN, scores);
    }
}

fn score_structure(structure: &ModelStructure, scores: &mut HashMap<&'static str, i64>) {
    for table in &structure.tables {
        score_text(&table.to_lowercase(), WEIGHT_TABLE_DOMAIN, scores);
    }
    for column in &structure.columns {
        score_text(&column.name.to_lowercase(), WEIGHT_COLUMN_DOMAIN, scores);
    }
}

/// +`domain_weight` for a domain-name substring, +1 per matched keyword.
fn score_text(lowered: &str, domain_weight: i64, scores: &mut HashMap<&'static str, i64>) {
    for (domain, keywords) in DOMAIN_KEYWORDS {
        if lowered.contains(domain) {
            *scores.entry(domain).or_default() += domain_weight;
        }
        for keyword in *keywords {
            if lowered.contains(keyword) {
                *scores.entry(domain).or_default() += WEIGHT_KEYWORD;
            }
        }
    }
}

fn infer_intent(metadata: &Metadata, structure: &ModelStructure) -> String {
    for key in ["intent", "purpose"] {
        if let Some(Value::String(intent)) = metadata.get(key) {
            return intent.clone();
        }
    }

    let measures = structure.measures.len();
    let columns = structure.columns.len();
    if measures > columns {
        "analytics".to_string()
    } else if columns > 0 && columns > measures * 2 {
        "modeling".to_string()
    } else {
        "review".to_string()
    }
}

/// Profile defaults lose to artifact metadata key-by-key; `tags` lists are
/// merged as a sorted, deduplicated union.
fn enrich_metadata(metadata: &Metadata, profile: Metadata) -> Metadata {
    let mut merged = profile.clone();
    for (key, value) in metadata {
        merged.insert(key.clone(), value.clone());
    }

    if let (Some(Value::Array(profile_tags)), Some(Value::Array(meta_tags))) =
        (profile.get("tags"), metadata.get("tags"))
    {
        let mut union: Vec<String> = profile_tags
            .iter()
            .chain(meta_tags.iter())
            .map(value_as_text)
            .collect();
        union.sort();
        union.dedup();
        merged.insert(
            "tags".to_string(),
            Value::Array(union.into_iter().map(Value::String).collect()),
        );
    }

    merged
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
