// lumen-core/src/domain/standards/rule.rs

use crate::domain::standards::naming::NamingStrategy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Canonical representation of a single standard or best-practice rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRule {
    pub id: String,
    pub title: String,
    pub resource: String,
    pub scope: EntityKind,
    pub category: RuleCategory,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    #[serde(default)]
    pub references: Vec<String>,
    // BTreeSet: deduplicated and sorted on serialization.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub applies_to: Vec<EntityKind>,
    pub automation: Automation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl StandardRule {
    /// `true` when the rule only detects and proposes nothing.
    pub fn is_detect_only(&self) -> bool {
        self.automation.auto_fix.is_none()
    }
}

/// Entity kind a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Measure,
    Column,
    Query,
    Model,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Measure => "measure",
            Self::Column => "column",
            Self::Query => "query",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Naming,
    Formatting,
    Coding,
    Performance,
    AntiPattern,
    Organisation,
    Documentation,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Formatting => "formatting",
            Self::Coding => "coding",
            Self::Performance => "performance",
            Self::AntiPattern => "anti_pattern",
            Self::Organisation => "organisation",
            Self::Documentation => "documentation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub check: CheckSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fix: Option<AutoFixSpec>,
}

/// Closed set of automated checks. Each variant carries only its relevant
/// fields, so a typo in a string-keyed configuration cannot slip through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckSpec {
    /// The named field must match a casing convention.
    Pattern { field: String, matcher: String },
    /// The named field must belong to the allowed set.
    Membership { field: String, allowed: Vec<String> },
    /// The named field must be present and non-empty.
    Presence { field: String },
    /// Textual lint keyed by the guideline it enforces.
    Lint { rule: String },
    /// Performance guideline, evaluated like a lint but scoped differently.
    Performance { rule: String },
    /// A documentation block must carry all named fields.
    RequiredFields { fields: Vec<String>, path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutoFixSpec {
    /// Rewrite the offending value with a casing strategy.
    Transform { strategy: NamingStrategy },
    /// Assign a fixed replacement value to the named field.
    Assign { field: String, value: String },
}

/// Alteration kind carried by an [`super::AutoFix`].
///
/// Unknown actions deserialize into `Unsupported` instead of failing, so a
/// newer catalog can flow through an older binary; the patch generator turns
/// them into commented placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixAction {
    Rename,
    SetDisplayFolder,
    SetFormatString,
    Unsupported(String),
}

impl FixAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rename => "rename",
            Self::SetDisplayFolder => "set_display_folder",
            Self::SetFormatString => "set_format_string",
            Self::Unsupported(other) => other,
        }
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FixAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FixAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "rename" => FixAction::Rename,
            "set_display_folder" => FixAction::SetDisplayFolder,
            "set_format_string" => FixAction::SetFormatString,
            _ => FixAction::Unsupported(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_check_spec_round_trip() -> Result<()> {
        let json = r#"{"type":"membership","field":"display_folder","allowed":["Sales KPIs"]}"#;
        let spec: CheckSpec = serde_json::from_str(json)?;
        assert_eq!(
            spec,
            CheckSpec::Membership {
                field: "display_folder".into(),
                allowed: vec!["Sales KPIs".into()],
            }
        );
        assert_eq!(serde_json::to_string(&spec)?, json);
        Ok(())
    }

    #[test]
    fn test_auto_fix_spec_strategy() -> Result<()> {
        let json = r#"{"type":"transform","strategy":"snake_case"}"#;
        let spec: AutoFixSpec = serde_json::from_str(json)?;
        assert_eq!(
            spec,
            AutoFixSpec::Transform {
                strategy: NamingStrategy::SnakeCase
            }
        );
        Ok(())
    }

    #[test]
    fn test_fix_action_keeps_unknown_values() -> Result<()> {
        let action: FixAction = serde_json::from_str(r#""set_description""#)?;
        assert_eq!(action, FixAction::Unsupported("set_description".into()));
        assert_eq!(serde_json::to_string(&action)?, r#""set_description""#);
        Ok(())
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Error);
        assert!(Severity::Warning > Severity::Info);
    }
}
