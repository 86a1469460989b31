// lumen-core/src/domain/standards/dax.rs

use crate::domain::standards::catalog::RuleCatalog;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const RULE_DIVISION: &str = "dax.coding.division";
pub const RULE_COUNTING: &str = "dax.coding.counting";
pub const RULE_GIANT_MEASURE: &str = "dax.anti_pattern.giant_measures_without_var";
pub const RULE_ALL_TABLE: &str = "dax.anti_pattern.all_table_when_all_column_is_enough";
pub const RULE_LOOKUPVALUE: &str = "dax.anti_pattern.using_strings_instead_of_ids_for_joins_f";

// Readability rule: expressions at or above this many lines should use VAR.
const LONG_MEASURE_LINES: usize = 4;

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"(?s)/\*.*?\*/").unwrap()
});
static ALL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"ALL\s*\(([^\)]+)\)").unwrap()
});

/// One anti-pattern hit inside a DAX expression. The validator attaches the
/// owning measure before it lands in the issue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaxFinding {
    pub rule_id: String,
    pub rule: String,
}

/// Lexical scanner over DAX expressions. Deliberately textual: it never
/// parses the expression, it only normalizes comments away and looks for
/// known smells.
pub struct DaxScanner<'a> {
    catalog: &'a RuleCatalog,
}

impl<'a> DaxScanner<'a> {
    pub fn new(catalog: &'a RuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn scan(&self, expression: &str) -> Vec<DaxFinding> {
        if expression.trim().is_empty() {
            return Vec::new();
        }

        let without_blocks = BLOCK_COMMENT.replace_all(expression, "");
        let lines: Vec<&str> = without_blocks
            .lines()
            .map(strip_line_comment)
            .filter(|line| !line.trim().is_empty())
            .collect();

        let normalized = lines.join("\n");
        let normalized_upper = normalized.to_uppercase();

        let mut findings = Vec::new();

        if normalized.contains('/') && !normalized_upper.contains("DIVIDE(") {
            findings.push(self.finding(
                RULE_DIVISION,
                "Use DIVIDE() instead of the raw division operator to avoid division-by-zero.",
            ));
        }

        if normalized_upper.contains("COUNT(") && !normalized_upper.contains("COUNTROWS(") {
            findings.push(self.finding(
                RULE_COUNTING,
                "Prefer COUNTROWS() over COUNT(<column>) for row counting.",
            ));
        }

        if lines.len() >= LONG_MEASURE_LINES && !normalized_upper.contains("VAR ") {
            findings.push(self.finding(
                RULE_GIANT_MEASURE,
                "Long DAX measures should declare intermediate VAR blocks for readability.",
            ));
        }

        // Table-level ALL() removes every filter; flagged once per expression.
        for capture in ALL_CALL.captures_iter(&normalized_upper) {
            if !capture[1].contains('[') {
                findings.push(self.finding(
                    RULE_ALL_TABLE,
                    "Use ALL(<column>) instead of ALL(<table>) to preserve slicer context when possible.",
                ));
                break;
            }
        }

        if normalized_upper.contains("LOOKUPVALUE(") {
            findings.push(self.finding(
                RULE_LOOKUPVALUE,
                "LOOKUPVALUE detected. Prefer model relationships or TREATAS for relational filtering.",
            ));
        }

        findings
    }

    /// Catalog description wins; the fallback keeps detection alive when the
    /// loaded catalog predates a rule.
    fn finding(&self, rule_id: &str, fallback: &str) -> DaxFinding {
        let rule = self
            .catalog
            .rule(rule_id)
            .map(|r| r.description.clone())
            .unwrap_or_else(|| fallback.to_string());
        DaxFinding {
            rule_id: rule_id.to_string(),
            rule,
        }
    }
}

/// Cuts `//` and `--` comments, whichever starts first on the line.
fn strip_line_comment(line: &str) -> &str {
    let cut = match (line.find("//"), line.find("--")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    match cut {
        Some(idx) => &line[..idx],
        None => line,
    }
}
