// lumen-core/src/domain/standards/mod.rs

pub mod catalog;
pub mod dax;
pub mod naming;
pub mod patch;
pub mod rule;
pub mod validator;

// Re-exports
pub use catalog::{CatalogSources, LegacyStandardsConfig, RuleCatalog, build_catalog};
pub use dax::DaxScanner;
pub use naming::{NamingStrategy, to_pascal_case_with_spaces, to_snake_case};
pub use patch::render_patch;
pub use rule::{
    Automation, AutoFixSpec, CheckSpec, EntityKind, FixAction, RuleCategory, Severity,
    StandardRule,
};
pub use validator::{AutoFix, Issue, StandardsValidator, Suggestion, ValidationResult,
    ValidationStatus};
