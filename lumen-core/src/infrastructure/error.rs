// lumen-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(lumen::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- JSON ---
    #[error("JSON Parsing Error: {0}")]
    #[diagnostic(code(lumen::infra::json), help("Check the JSON syntax of the file."))]
    Json(#[from] serde_json::Error),

    // --- CATALOG ---
    #[error("Standards catalog not found at '{0}'")]
    #[diagnostic(code(lumen::infra::catalog_missing))]
    CatalogNotFound(PathBuf),

    // --- MODEL EXTRACTION ---
    #[error("No model schema found inside '{0}'")]
    #[diagnostic(
        code(lumen::infra::schema_missing),
        help("PBIP bundles must contain a DataModelSchema.json or model.json.")
    )]
    SchemaNotFound(PathBuf),

    #[error("Unsupported source '{0}': expected a .pbip bundle or a .json model")]
    #[diagnostic(code(lumen::infra::unsupported_source))]
    UnsupportedSource(PathBuf),
}

impl InfrastructureError {
    /// Machine-readable reason code, surfaced in CLI JSON output.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::CatalogNotFound(_) => "catalog_missing",
            Self::SchemaNotFound(_) => "schema_missing",
            Self::UnsupportedSource(_) => "unsupported_source",
        }
    }
}
