// lumen-core/src/domain/standards/validator.rs

use crate::domain::model::{Column, Measure, ModelStructure};
use crate::domain::standards::catalog::{RECOMMENDED_FORMAT_STRING, RuleCatalog};
use crate::domain::standards::dax::DaxScanner;
use crate::domain::standards::naming::NamingStrategy;
use crate::domain::standards::rule::{
    AutoFixSpec, CheckSpec, EntityKind, FixAction, StandardRule,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MEASURE_NAMING_RULE: &str = "dax.naming.measure.snake_case";
const COLUMN_NAMING_RULE: &str = "dax.naming.column.pascal_case";
const DISPLAY_FOLDER_RULE: &str = "dax.naming.display_folder.allowed";
const FORMAT_STRING_RULE: &str = "dax.formatting.measure.format_string_required";

// Last-resort folder when the catalog carries no display-folder rule.
const FALLBACK_FOLDER: &str = "_Final";

/// One failed check on one entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub entity: EntityKind,
    pub name: String,
    pub rule_id: Option<String>,
    /// Human-readable rule description.
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
}

/// A suggested correction: either one concrete value or the sorted set of
/// acceptable values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Suggestion {
    Value(String),
    Options(Vec<String>),
}

/// A concrete, renderable correction. Only emitted when the owning table is
/// known, so the patch generator can always qualify the statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFix {
    pub entity: EntityKind,
    pub table: String,
    pub current: String,
    pub suggested: String,
    pub action: FixAction,
    pub rule_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Skipped,
    Ok,
    IssuesFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub issues: Vec<Issue>,
    pub auto_fixes: Vec<AutoFix>,
    pub issue_count: usize,
}

impl ValidationResult {
    /// Typed result for artifacts whose structure could not be read.
    /// Never an error: the pipeline keeps going.
    pub fn skipped(source: &str, reason: &str) -> Self {
        Self {
            status: ValidationStatus::Skipped,
            source: source.to_string(),
            reason: Some(reason.to_string()),
            issues: Vec::new(),
            auto_fixes: Vec::new(),
            issue_count: 0,
        }
    }
}

/// Runs every per-entity check against an extracted model structure.
/// Holds only borrowed, read-only state; safe to share across workers.
pub struct StandardsValidator<'a> {
    scanner: DaxScanner<'a>,
    measure_naming: NamingCheck<'a>,
    column_naming: NamingCheck<'a>,
    folder_policy: FolderPolicy<'a>,
    format_rule: Option<&'a StandardRule>,
    recommended_format: String,
}

struct NamingCheck<'a> {
    rule: Option<&'a StandardRule>,
    strategy: NamingStrategy,
    fallback_description: &'static str,
}

struct FolderPolicy<'a> {
    rule: Option<&'a StandardRule>,
    allowed: Vec<String>,
    default: String,
}

impl<'a> StandardsValidator<'a> {
    pub fn new(catalog: &'a RuleCatalog) -> Self {
        let measure_rule = catalog.rule(MEASURE_NAMING_RULE);
        let column_rule = catalog.rule(COLUMN_NAMING_RULE);
        let folder_rule = catalog.rule(DISPLAY_FOLDER_RULE);
        let format_rule = catalog.rule(FORMAT_STRING_RULE);

        let allowed = folder_rule.map(allowed_values).unwrap_or_default();
        let default = folder_rule
            .and_then(assigned_value)
            .or_else(|| allowed.first().cloned())
            .unwrap_or_else(|| FALLBACK_FOLDER.to_string());

        Self {
            scanner: DaxScanner::new(catalog),
            measure_naming: NamingCheck {
                rule: measure_rule,
                strategy: naming_strategy(measure_rule).unwrap_or(NamingStrategy::SnakeCase),
                fallback_description: "DAX measures must follow snake_case with a semantic prefix",
            },
            column_naming: NamingCheck {
                rule: column_rule,
                strategy: naming_strategy(column_rule)
                    .unwrap_or(NamingStrategy::PascalCaseWithSpaces),
                fallback_description: "Columns should use PascalCase with optional spaces",
            },
            folder_policy: FolderPolicy {
                rule: folder_rule,
                allowed,
                default,
            },
            format_rule,
            recommended_format: format_rule
                .and_then(assigned_value)
                .unwrap_or_else(|| RECOMMENDED_FORMAT_STRING.to_string()),
        }
    }

    pub fn validate(&self, source: &str, structure: &ModelStructure) -> ValidationResult {
        if structure.is_empty() {
            return ValidationResult::skipped(
                source,
                "Structure could not be parsed from the artifact.",
            );
        }

        let mut issues = Vec::new();
        let mut fixes = Vec::new();

        // Encounter order is a contract: measures first, then columns, each
        // in structure order.
        for measure in &structure.measures {
            self.check_measure(measure, &mut issues, &mut fixes);
        }
        for column in &structure.columns {
            self.check_column(column, &mut issues, &mut fixes);
        }

        let status = if issues.is_empty() {
            ValidationStatus::Ok
        } else {
            ValidationStatus::IssuesFound
        };

        ValidationResult {
            status,
            source: source.to_string(),
            reason: None,
            issue_count: issues.len(),
            issues,
            auto_fixes: fixes,
        }
    }

    fn check_measure(&self, measure: &Measure, issues: &mut Vec<Issue>, fixes: &mut Vec<AutoFix>) {
        let name = &measure.name;

        // (a) naming
        if !self.measure_naming.strategy.matches(name) {
            let suggested = self.measure_naming.strategy.apply(name);
            issues.push(self.naming_issue(EntityKind::Measure, name, &self.measure_naming, &suggested));
            if let Some(table) = &measure.table {
                fixes.push(AutoFix {
                    entity: EntityKind::Measure,
                    table: table.clone(),
                    current: name.clone(),
                    suggested,
                    action: FixAction::Rename,
                    rule_id: self.measure_naming.rule.map(|r| r.id.clone()),
                });
            }
        }

        // (b) display folder
        let folder_rule_id = self.folder_policy.rule.map(|r| r.id.clone());
        match measure.display_folder.as_deref() {
            // An empty folder counts as unassigned.
            None | Some("") => {
                issues.push(Issue {
                    entity: EntityKind::Measure,
                    name: name.clone(),
                    rule_id: folder_rule_id.clone(),
                    rule: rule_description(
                        self.folder_policy.rule,
                        "Measures should define a display folder for report organization",
                    ),
                    suggested: Some(Suggestion::Value(self.folder_policy.default.clone())),
                    found: None,
                });
                if let Some(table) = &measure.table {
                    fixes.push(self.folder_fix(EntityKind::Measure, table, name, folder_rule_id));
                }
            }
            Some(folder)
                if !self.folder_policy.allowed.is_empty()
                    && !self.folder_policy.allowed.iter().any(|f| f == folder) =>
            {
                let mut allowed = self.folder_policy.allowed.clone();
                allowed.sort();
                issues.push(Issue {
                    entity: EntityKind::Measure,
                    name: name.clone(),
                    rule_id: folder_rule_id.clone(),
                    rule: rule_description(
                        self.folder_policy.rule,
                        "Display folder should match the approved catalog",
                    ),
                    suggested: Some(Suggestion::Options(allowed)),
                    found: Some(folder.to_string()),
                });
                if let Some(table) = &measure.table {
                    fixes.push(self.folder_fix(EntityKind::Measure, table, name, folder_rule_id));
                }
            }
            Some(_) => {}
        }

        // (c) format string
        if measure.format_string.as_deref().is_none_or(str::is_empty) {
            issues.push(Issue {
                entity: EntityKind::Measure,
                name: name.clone(),
                rule_id: self.format_rule.map(|r| r.id.clone()),
                rule: rule_description(
                    self.format_rule,
                    "Measures should specify formatString for consistent presentation",
                ),
                suggested: Some(Suggestion::Value(self.recommended_format.clone())),
                found: None,
            });
            if let Some(table) = &measure.table {
                fixes.push(AutoFix {
                    entity: EntityKind::Measure,
                    table: table.clone(),
                    current: name.clone(),
                    suggested: self.recommended_format.clone(),
                    action: FixAction::SetFormatString,
                    rule_id: self.format_rule.map(|r| r.id.clone()),
                });
            }
        }

        // (d) expression anti-patterns
        if let Some(expression) = &measure.expression {
            for finding in self.scanner.scan(expression.trim()) {
                issues.push(Issue {
                    entity: EntityKind::Measure,
                    name: name.clone(),
                    rule_id: Some(finding.rule_id),
                    rule: finding.rule,
                    suggested: None,
                    found: None,
                });
            }
        }
    }

    fn check_column(&self, column: &Column, issues: &mut Vec<Issue>, fixes: &mut Vec<AutoFix>) {
        let name = &column.name;

        if !self.column_naming.strategy.matches(name) {
            let suggested = self.column_naming.strategy.apply(name);
            issues.push(self.naming_issue(EntityKind::Column, name, &self.column_naming, &suggested));
            if let Some(table) = &column.table {
                fixes.push(AutoFix {
                    entity: EntityKind::Column,
                    table: table.clone(),
                    current: name.clone(),
                    suggested,
                    action: FixAction::Rename,
                    rule_id: self.column_naming.rule.map(|r| r.id.clone()),
                });
            }
        }

        // Folder assignment is measure-only policy: a column with no folder
        // (an empty one counts as unassigned) is fine, one outside the
        // allowed set is not.
        if let Some(folder) = column.display_folder.as_deref()
            && !folder.is_empty()
            && !self.folder_policy.allowed.is_empty()
            && !self.folder_policy.allowed.iter().any(|f| f == folder)
        {
            let folder_rule_id = self.folder_policy.rule.map(|r| r.id.clone());
            let mut allowed = self.folder_policy.allowed.clone();
            allowed.sort();
            issues.push(Issue {
                entity: EntityKind::Column,
                name: name.clone(),
                rule_id: folder_rule_id.clone(),
                rule: rule_description(
                    self.folder_policy.rule,
                    "Column display folders should use approved naming conventions",
                ),
                suggested: Some(Suggestion::Options(allowed)),
                found: Some(folder.to_string()),
            });
            if let Some(table) = &column.table {
                fixes.push(self.folder_fix(EntityKind::Column, table, name, folder_rule_id));
            }
        }
    }

    fn naming_issue(
        &self,
        entity: EntityKind,
        name: &str,
        check: &NamingCheck<'_>,
        suggested: &str,
    ) -> Issue {
        Issue {
            entity,
            name: name.to_string(),
            rule_id: check.rule.map(|r| r.id.clone()),
            rule: rule_description(check.rule, check.fallback_description),
            suggested: Some(Suggestion::Value(suggested.to_string())),
            found: None,
        }
    }

    fn folder_fix(
        &self,
        entity: EntityKind,
        table: &str,
        name: &str,
        rule_id: Option<String>,
    ) -> AutoFix {
        AutoFix {
            entity,
            table: table.to_string(),
            current: name.to_string(),
            suggested: self.folder_policy.default.clone(),
            action: FixAction::SetDisplayFolder,
            rule_id,
        }
    }
}

// --- RULE INTROSPECTION HELPERS ---

fn rule_description(rule: Option<&StandardRule>, fallback: &str) -> String {
    rule.map(|r| r.description.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Resolves the casing strategy of a naming rule: the auto-fix strategy wins,
/// then the known matcher phrasings from the legacy configuration.
fn naming_strategy(rule: Option<&StandardRule>) -> Option<NamingStrategy> {
    let rule = rule?;
    if let Some(AutoFixSpec::Transform { strategy }) = &rule.automation.auto_fix {
        return Some(*strategy);
    }
    if let CheckSpec::Pattern { matcher, .. } = &rule.automation.check {
        return match matcher.as_str() {
            "snake_case" | "snake_case with semantic prefix" => Some(NamingStrategy::SnakeCase),
            "PascalCase" | "PascalCase with spaces for user-facing" => {
                Some(NamingStrategy::PascalCaseWithSpaces)
            }
            _ => None,
        };
    }
    None
}

fn allowed_values(rule: &StandardRule) -> Vec<String> {
    if let CheckSpec::Membership { allowed, .. } = &rule.automation.check {
        if !allowed.is_empty() {
            return allowed.clone();
        }
    }
    // Older catalogs carried the set only in details.allowed.
    rule.details
        .get("allowed")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn assigned_value(rule: &StandardRule) -> Option<String> {
    match &rule.automation.auto_fix {
        Some(AutoFixSpec::Assign { value, .. }) => Some(value.clone()),
        _ => None,
    }
}
