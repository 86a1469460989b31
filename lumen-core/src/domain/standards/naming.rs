// lumen-core/src/domain/standards/naming.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// The Regex are compiled only once; both transforms stay total and idempotent.
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern, checked by tests
    Regex::new(r"[^0-9A-Za-z]+").unwrap()
});
static CASE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"([a-z0-9])([A-Z])").unwrap()
});
static MULTI_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"_{2,}").unwrap()
});
static SNAKE_CASE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-z0-9]+(?:_[a-z0-9]+)*$").unwrap()
});
static PASCAL_CASE_WITH_SPACES: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Z][A-Za-z0-9]*(?: [A-Z][A-Za-z0-9]*)*$").unwrap()
});

/// Lowercases a name into `snake_case`: non-alphanumeric runs become `_`,
/// a `_` is inserted at lower/digit → upper boundaries, repeats collapse.
pub fn to_snake_case(name: &str) -> String {
    let cleaned = NON_ALNUM.replace_all(name, "_");
    let trimmed = cleaned.trim_matches('_');
    let split = CASE_BOUNDARY.replace_all(trimmed, "${1}_${2}");
    MULTI_UNDERSCORE.replace_all(&split, "_").to_lowercase()
}

/// Title-cases a name into `Pascal Case With Spaces`. Returns the input
/// unchanged when no alphanumeric content remains.
pub fn to_pascal_case_with_spaces(name: &str) -> String {
    let cleaned = NON_ALNUM.replace_all(name, " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return name.to_string();
    }
    trimmed
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The two supported casing conventions. Closed set: adding a strategy means
/// adding a variant, not a config string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    SnakeCase,
    PascalCaseWithSpaces,
}

impl NamingStrategy {
    pub fn pattern(&self) -> &'static Regex {
        match self {
            Self::SnakeCase => &SNAKE_CASE,
            Self::PascalCaseWithSpaces => &PASCAL_CASE_WITH_SPACES,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern().is_match(name)
    }

    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::SnakeCase => to_snake_case(name),
            Self::PascalCaseWithSpaces => to_pascal_case_with_spaces(name),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SnakeCase => "snake_case",
            Self::PascalCaseWithSpaces => "pascal_case_with_spaces",
        }
    }
}

// --- UNIT TESTS ---
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_transform() {
        assert_eq!(to_snake_case("TotalSales"), "total_sales");
        assert_eq!(to_snake_case("Total Sales (EUR)"), "total_sales_eur");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPServer2"), "httpserver2");
    }

    #[test]
    fn test_pascal_case_transform() {
        assert_eq!(to_pascal_case_with_spaces("customer id"), "Customer Id");
        assert_eq!(to_pascal_case_with_spaces("order_total"), "Order Total");
        assert_eq!(to_pascal_case_with_spaces("Customer Id"), "Customer Id");
    }

    #[test]
    fn test_pascal_case_keeps_non_alnum_input() {
        // Nothing left to capitalize, the original name comes back untouched.
        assert_eq!(to_pascal_case_with_spaces("___"), "___");
    }

    #[test]
    fn test_transforms_are_total_and_idempotent() {
        let samples = [
            "TotalSales",
            "Total_Sales",
            "customer id",
            "  spaced  ",
            "42answer",
            "Ünïcode-Name",
            "",
        ];
        for name in samples {
            let snake = to_snake_case(name);
            assert_eq!(to_snake_case(&snake), snake, "snake not idempotent for {name:?}");
            let pascal = to_pascal_case_with_spaces(name);
            assert_eq!(
                to_pascal_case_with_spaces(&pascal),
                pascal,
                "pascal not idempotent for {name:?}"
            );
            if !snake.is_empty() {
                assert!(
                    NamingStrategy::SnakeCase.matches(&snake),
                    "{snake:?} must satisfy the snake_case pattern"
                );
            }
            if !pascal.is_empty() && pascal != name {
                assert!(
                    NamingStrategy::PascalCaseWithSpaces.matches(&pascal),
                    "{pascal:?} must satisfy the PascalCase-with-spaces pattern"
                );
            }
        }
    }

    #[test]
    fn test_conformant_names_are_not_rewritten() {
        assert!(NamingStrategy::SnakeCase.matches("total_sales"));
        assert!(NamingStrategy::SnakeCase.matches("margin2024"));
        assert!(!NamingStrategy::SnakeCase.matches("TotalSales"));
        assert!(NamingStrategy::PascalCaseWithSpaces.matches("Sales KPIs"));
        assert!(!NamingStrategy::PascalCaseWithSpaces.matches("customer id"));
    }
}
