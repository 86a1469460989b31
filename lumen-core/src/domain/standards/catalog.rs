// lumen-core/src/domain/standards/catalog.rs

use crate::domain::standards::naming::NamingStrategy;
use crate::domain::standards::rule::{
    Automation, AutoFixSpec, CheckSpec, EntityKind, RuleCategory, Severity, StandardRule,
};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Fixed recommended format literal for the always-on formatting rule.
pub const RECOMMENDED_FORMAT_STRING: &str = "#,##0.00;(#,##0.00);-";

const DAX_SOURCE_DEFAULT: &str = "external/DAX_Templates/Standards/02_DAX_Standards_and_Naming.md";
const POWER_QUERY_SOURCE_DEFAULT: &str = "external/Power_Query_guide/Standards/FORMATTER.md";

// Anti-pattern ids are bounded so catalog keys stay readable.
const ANTI_PATTERN_ID_LEN: usize = 40;

static SLUG_CLEANER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"[^a-zA-Z0-9]+").unwrap()
});

/// Shared, read-only collection of standard rules. Built fresh from the
/// legacy configuration or loaded verbatim from its persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCatalog {
    pub version: Option<String>,
    pub rule_count: usize,
    #[serde(default)]
    pub sources: CatalogSources,
    #[serde(default)]
    pub rules: Vec<StandardRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSources {
    pub legacy_config: Option<String>,
}

impl RuleCatalog {
    /// Catalog with no rules; the fallback when no legacy config exists.
    pub fn empty() -> Self {
        Self {
            version: None,
            rule_count: 0,
            sources: CatalogSources::default(),
            rules: Vec::new(),
        }
    }

    pub fn rule(&self, id: &str) -> Option<&StandardRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn iter_by_resource<'a>(
        &'a self,
        resource: Option<&'a str>,
    ) -> impl Iterator<Item = &'a StandardRule> {
        self.rules
            .iter()
            .filter(move |rule| resource.is_none_or(|r| rule.resource == r))
    }

    /// Copy with the build timestamp stripped, for sync comparison.
    pub fn normalized(&self) -> Self {
        Self {
            version: None,
            ..self.clone()
        }
    }
}

// --- LEGACY CONFIGURATION (ad hoc shape, read-only input) ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyStandardsConfig {
    #[serde(default, rename = "DAX_Templates")]
    pub dax_templates: DaxTemplates,
    #[serde(default, rename = "Power_Query_guide")]
    pub power_query_guide: PowerQueryGuide,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaxTemplates {
    pub source: Option<String>,
    #[serde(default)]
    pub naming: DaxNaming,
    // BTreeMap keeps rule generation order deterministic across builds.
    #[serde(default)]
    pub coding: BTreeMap<String, Value>,
    #[serde(default)]
    pub performance: BTreeMap<String, Value>,
    #[serde(default)]
    pub anti_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaxNaming {
    pub measures: Option<String>,
    pub columns: Option<String>,
    #[serde(default)]
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerQueryGuide {
    pub source: Option<String>,
    #[serde(default)]
    pub formatting: BTreeMap<String, Value>,
    #[serde(default)]
    pub doc_block: DocBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocBlock {
    #[serde(default)]
    pub required: Vec<String>,
}

// --- CATALOG BUILDER ---

/// Converts the legacy configuration into canonical rules. Pure: the same
/// configuration always yields identical rules (only `version` varies).
pub fn build_catalog(
    config: &LegacyStandardsConfig,
    legacy_source: Option<String>,
) -> RuleCatalog {
    let mut rules = Vec::new();
    rules.extend(build_dax_rules(&config.dax_templates));
    rules.extend(build_power_query_rules(&config.power_query_guide));

    RuleCatalog {
        version: Some(Utc::now().to_rfc3339()),
        rule_count: rules.len(),
        sources: CatalogSources {
            legacy_config: legacy_source,
        },
        rules,
    }
}

fn build_dax_rules(dax: &DaxTemplates) -> Vec<StandardRule> {
    let source = dax.source.clone().unwrap_or_else(|| DAX_SOURCE_DEFAULT.into());
    let mut rules = Vec::new();

    let measure_pattern = dax
        .naming
        .measures
        .clone()
        .unwrap_or_else(|| "snake_case".into());
    rules.push(StandardRule {
        id: "dax.naming.measure.snake_case".into(),
        title: "Measures follow snake_case with semantic prefix".into(),
        resource: "DAX".into(),
        scope: EntityKind::Measure,
        category: RuleCategory::Naming,
        severity: Severity::Warning,
        description: format!("Measures must follow: {measure_pattern}"),
        details: details([("pattern", Value::String(measure_pattern.clone()))]),
        references: vec![source.clone()],
        tags: tags(["dax", "measure", "naming"]),
        applies_to: vec![EntityKind::Measure],
        automation: Automation {
            check: CheckSpec::Pattern {
                field: "name".into(),
                matcher: measure_pattern,
            },
            auto_fix: Some(AutoFixSpec::Transform {
                strategy: NamingStrategy::SnakeCase,
            }),
        },
        rationale: None,
    });

    let column_pattern = dax
        .naming
        .columns
        .clone()
        .unwrap_or_else(|| "PascalCase".into());
    rules.push(StandardRule {
        id: "dax.naming.column.pascal_case".into(),
        title: "Columns use PascalCase with optional spaces".into(),
        resource: "DAX".into(),
        scope: EntityKind::Column,
        category: RuleCategory::Naming,
        severity: Severity::Info,
        description: format!("Columns should follow: {column_pattern}"),
        details: details([("pattern", Value::String(column_pattern.clone()))]),
        references: vec![source.clone()],
        tags: tags(["dax", "column", "naming"]),
        applies_to: vec![EntityKind::Column],
        automation: Automation {
            check: CheckSpec::Pattern {
                field: "name".into(),
                matcher: column_pattern,
            },
            auto_fix: Some(AutoFixSpec::Transform {
                strategy: NamingStrategy::PascalCaseWithSpaces,
            }),
        },
        rationale: None,
    });

    if let Some(default_folder) = dax.naming.folders.first() {
        rules.push(StandardRule {
            id: "dax.naming.display_folder.allowed".into(),
            title: "Approved display folders".into(),
            resource: "DAX".into(),
            scope: EntityKind::Measure,
            category: RuleCategory::Organisation,
            severity: Severity::Info,
            description: "Measures and columns should reside in the curated display folders."
                .into(),
            details: details([
                (
                    "allowed",
                    Value::Array(dax.naming.folders.iter().cloned().map(Value::String).collect()),
                ),
                ("default", Value::String(default_folder.clone())),
            ]),
            references: vec![source.clone()],
            tags: tags(["display_folder", "organisation"]),
            applies_to: vec![EntityKind::Measure, EntityKind::Column],
            automation: Automation {
                check: CheckSpec::Membership {
                    field: "display_folder".into(),
                    allowed: dax.naming.folders.clone(),
                },
                auto_fix: Some(AutoFixSpec::Assign {
                    field: "display_folder".into(),
                    value: default_folder.clone(),
                }),
            },
            rationale: None,
        });
    }

    for (key, guidance) in &dax.coding {
        let rule_id = format!("dax.coding.{}", slug(key));
        rules.push(StandardRule {
            id: rule_id,
            title: format!("DAX coding guideline: {key}"),
            resource: "DAX".into(),
            scope: EntityKind::Measure,
            category: RuleCategory::Coding,
            severity: Severity::Info,
            description: value_text(guidance),
            details: BTreeMap::new(),
            references: vec![source.clone()],
            tags: tags(["coding", key]),
            applies_to: vec![EntityKind::Measure],
            automation: Automation {
                check: CheckSpec::Lint { rule: key.clone() },
                auto_fix: None,
            },
            rationale: None,
        });
    }

    for (key, guidance) in &dax.performance {
        let applies_to = performance_scope(key);
        rules.push(StandardRule {
            id: format!("dax.performance.{}", slug(key)),
            title: format!("DAX performance guideline: {key}"),
            resource: "DAX".into(),
            scope: applies_to[0],
            category: RuleCategory::Performance,
            severity: Severity::Info,
            description: value_text(guidance),
            details: BTreeMap::new(),
            references: vec![source.clone()],
            tags: tags(["performance", key]),
            applies_to: applies_to.clone(),
            automation: Automation {
                check: CheckSpec::Performance { rule: key.clone() },
                auto_fix: None,
            },
            rationale: None,
        });
    }

    for entry in &dax.anti_patterns {
        let rule_id = format!(
            "dax.anti_pattern.{}",
            slug(entry).chars().take(ANTI_PATTERN_ID_LEN).collect::<String>()
        );
        rules.push(StandardRule {
            id: rule_id.clone(),
            title: "DAX anti-pattern".into(),
            resource: "DAX".into(),
            scope: EntityKind::Measure,
            category: RuleCategory::AntiPattern,
            severity: Severity::Warning,
            description: entry.clone(),
            details: BTreeMap::new(),
            references: vec![source.clone()],
            tags: tags(["anti_pattern", "dax"]),
            applies_to: vec![EntityKind::Measure],
            automation: Automation {
                check: CheckSpec::Lint { rule: rule_id },
                auto_fix: None,
            },
            rationale: None,
        });
    }

    rules.push(StandardRule {
        id: "dax.formatting.measure.format_string_required".into(),
        title: "Measures define formatString".into(),
        resource: "DAX".into(),
        scope: EntityKind::Measure,
        category: RuleCategory::Formatting,
        severity: Severity::Warning,
        description: "Measures should specify formatString for consistent reporting.".into(),
        details: details([(
            "recommended",
            Value::String(RECOMMENDED_FORMAT_STRING.into()),
        )]),
        references: vec![source],
        tags: tags(["formatting"]),
        applies_to: vec![EntityKind::Measure],
        automation: Automation {
            check: CheckSpec::Presence {
                field: "format_string".into(),
            },
            auto_fix: Some(AutoFixSpec::Assign {
                field: "format_string".into(),
                value: RECOMMENDED_FORMAT_STRING.into(),
            }),
        },
        rationale: None,
    });

    rules
}

fn build_power_query_rules(pq: &PowerQueryGuide) -> Vec<StandardRule> {
    let source = pq
        .source
        .clone()
        .unwrap_or_else(|| POWER_QUERY_SOURCE_DEFAULT.into());
    let mut rules = Vec::new();

    for (key, guidance) in &pq.formatting {
        rules.push(StandardRule {
            id: format!("power_query.formatting.{}", slug(key)),
            title: format!("Power Query formatting: {key}"),
            resource: "PowerQuery".into(),
            scope: EntityKind::Query,
            category: RuleCategory::Formatting,
            severity: Severity::Info,
            description: value_text(guidance),
            details: BTreeMap::new(),
            references: vec![source.clone()],
            tags: tags(["power_query", key]),
            applies_to: vec![EntityKind::Query],
            automation: Automation {
                check: CheckSpec::Lint { rule: key.clone() },
                auto_fix: None,
            },
            rationale: None,
        });
    }

    if !pq.doc_block.required.is_empty() {
        rules.push(StandardRule {
            id: "power_query.documentation.doc_block_required".into(),
            title: "Power Query documentation block".into(),
            resource: "PowerQuery".into(),
            scope: EntityKind::Query,
            category: RuleCategory::Documentation,
            severity: Severity::Warning,
            description: "Power Query scripts require a documentation block with the specified fields."
                .into(),
            details: details([(
                "required_fields",
                Value::Array(
                    pq.doc_block
                        .required
                        .iter()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ),
            )]),
            references: vec![source],
            tags: tags(["documentation", "power_query"]),
            applies_to: vec![EntityKind::Query],
            automation: Automation {
                check: CheckSpec::RequiredFields {
                    fields: pq.doc_block.required.clone(),
                    path: "documentation".into(),
                },
                auto_fix: None,
            },
            rationale: None,
        });
    }

    rules
}

// --- HELPERS ---

fn slug(value: &str) -> String {
    let cleaned = SLUG_CLEANER
        .replace_all(value, "_")
        .trim_matches('_')
        .to_lowercase();
    if cleaned.is_empty() { "rule".into() } else { cleaned }
}

fn performance_scope(key: &str) -> Vec<EntityKind> {
    match key {
        "iterators" | "measures" => vec![EntityKind::Measure],
        "relationships" => vec![EntityKind::Model],
        _ => vec![EntityKind::Model],
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn details<const N: usize>(entries: [(&str, Value); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn tags<'a>(entries: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    entries.into_iter().map(str::to_string).collect()
}

// --- UNIT TESTS ---
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample_config() -> LegacyStandardsConfig {
        serde_json::from_value(serde_json::json!({
            "DAX_Templates": {
                "naming": {
                    "measures": "snake_case with semantic prefix",
                    "columns": "PascalCase with spaces for user-facing",
                    "folders": ["Sales KPIs", "_Final"]
                },
                "coding": {
                    "division": "Use DIVIDE() instead of '/'",
                    "counting": "Prefer COUNTROWS() over COUNT()"
                },
                "performance": {
                    "iterators": "Avoid nested iterators",
                    "relationships": "Prefer single-direction relationships"
                },
                "anti_patterns": [
                    "Giant measures without VAR",
                    "ALL(table) when ALL(column) is enough"
                ]
            },
            "Power_Query_guide": {
                "formatting": { "indentation": "Four spaces per step" },
                "doc_block": { "required": ["Description", "Author"] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = sample_config();
        let first = build_catalog(&config, Some("external/standards_mcp.json".into()));
        let second = build_catalog(&config, Some("external/standards_mcp.json".into()));
        // Only the version timestamp may differ between builds.
        assert_eq!(first.normalized(), second.normalized());
        assert_eq!(first.rules, second.rules);
        assert_eq!(first.rule_count, first.rules.len());
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let catalog = build_catalog(&sample_config(), None);
        let mut seen = BTreeSet::new();
        for rule in &catalog.rules {
            assert!(seen.insert(rule.id.clone()), "duplicate rule id {}", rule.id);
        }
        assert!(catalog.rule("dax.naming.measure.snake_case").is_some());
        assert!(catalog.rule("dax.naming.column.pascal_case").is_some());
        assert!(catalog.rule("dax.naming.display_folder.allowed").is_some());
        assert!(catalog.rule("dax.formatting.measure.format_string_required").is_some());
        assert!(catalog.rule("dax.coding.division").is_some());
        assert!(catalog.rule("dax.anti_pattern.giant_measures_without_var").is_some());
    }

    #[test]
    fn test_anti_pattern_ids_are_bounded() {
        let mut config = sample_config();
        config.dax_templates.anti_patterns = vec![
            "Using strings instead of IDs for joins forces expensive lookups everywhere".into(),
        ];
        let catalog = build_catalog(&config, None);
        let rule = catalog
            .rules
            .iter()
            .find(|r| r.category == RuleCategory::AntiPattern)
            .unwrap();
        let suffix = rule.id.trim_start_matches("dax.anti_pattern.");
        assert!(suffix.len() <= ANTI_PATTERN_ID_LEN);
        assert_eq!(rule.id, "dax.anti_pattern.using_strings_instead_of_ids_for_joins_f");
    }

    #[test]
    fn test_display_folder_rule_only_with_folders() {
        let mut config = sample_config();
        config.dax_templates.naming.folders.clear();
        let catalog = build_catalog(&config, None);
        assert!(catalog.rule("dax.naming.display_folder.allowed").is_none());
    }

    #[test]
    fn test_empty_config_still_emits_fixed_rules() {
        let catalog = build_catalog(&LegacyStandardsConfig::default(), None);
        // Naming rules and the format-string rule are always present.
        assert_eq!(catalog.rules.len(), 3);
        let format_rule = catalog
            .rule("dax.formatting.measure.format_string_required")
            .unwrap();
        assert_eq!(
            format_rule.details.get("recommended"),
            Some(&Value::String(RECOMMENDED_FORMAT_STRING.into()))
        );
    }

    #[test]
    fn test_catalog_round_trips_through_json() -> Result<()> {
        let catalog = build_catalog(&sample_config(), Some("legacy.json".into()));
        let text = serde_json::to_string_pretty(&catalog)?;
        let loaded: RuleCatalog = serde_json::from_str(&text)?;
        assert_eq!(loaded, catalog);
        Ok(())
    }

    #[test]
    fn test_tags_deduplicated_and_sorted() {
        let catalog = build_catalog(&sample_config(), None);
        let rule = catalog.rule("dax.naming.measure.snake_case").unwrap();
        let serialized = serde_json::to_value(rule).unwrap();
        assert_eq!(
            serialized["tags"],
            serde_json::json!(["dax", "measure", "naming"])
        );
    }
}
