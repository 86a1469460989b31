// lumen-core/src/infrastructure/extract.rs

use crate::domain::model::{Column, Measure, ModelStructure};
use crate::infrastructure::error::InfrastructureError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extracts a minimal model structure from a PBIP artifact.
///
/// Accepted inputs are `.pbip` bundle directories (holding a
/// `DataModelSchema.json` or `model.json`) and standalone `.json` / `.pbip`
/// files carrying the schema directly. Parse and shape problems come back as
/// typed errors; callers downgrade them to a skipped validation rather than
/// aborting a run.
pub fn load_model_structure(source: &Path) -> Result<ModelStructure, InfrastructureError> {
    let data = read_schema_document(source)?;
    Ok(structure_from_schema(&data))
}

fn read_schema_document(source: &Path) -> Result<Value, InfrastructureError> {
    if source.is_dir() {
        if !has_extension(source, "pbip") {
            return Err(InfrastructureError::UnsupportedSource(source.to_path_buf()));
        }
        let schema = find_bundle_schema(source)
            .ok_or_else(|| InfrastructureError::SchemaNotFound(source.to_path_buf()))?;
        debug!(schema = %schema.display(), "resolved bundle schema");
        let content = std::fs::read_to_string(schema)?;
        return Ok(serde_json::from_str(&content)?);
    }

    if has_extension(source, "json") || has_extension(source, "pbip") {
        let content = std::fs::read_to_string(source)?;
        return Ok(serde_json::from_str(&content)?);
    }

    Err(InfrastructureError::UnsupportedSource(source.to_path_buf()))
}

/// Direct children win over nested copies so a bundle-level schema shadows
/// any report-embedded duplicate.
fn find_bundle_schema(bundle: &Path) -> Option<PathBuf> {
    for name in ["DataModelSchema.json", "model.json"] {
        let direct = bundle.join(name);
        if direct.is_file() {
            return Some(direct);
        }
    }

    WalkDir::new(bundle)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == "DataModelSchema.json")
        .map(|entry| entry.into_path())
}

fn structure_from_schema(data: &Value) -> ModelStructure {
    let model = field(data, "model").unwrap_or(&Value::Null);
    let tables_raw = field(model, "tables")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut structure = ModelStructure::default();

    for table in &tables_raw {
        let table_name = text_field(table, "name");
        if let Some(name) = &table_name {
            structure.tables.push(name.clone());
        }

        for measure in array_field(table, "measures") {
            if let Some(name) = text_field(measure, "name") {
                structure.measures.push(Measure {
                    table: table_name.clone(),
                    name,
                    display_folder: text_field(measure, "displayFolder"),
                    format_string: text_field(measure, "formatString"),
                    expression: expression_text(measure),
                });
            }
        }

        for column in array_field(table, "columns") {
            if let Some(name) = text_field(column, "name") {
                structure.columns.push(Column {
                    table: table_name.clone(),
                    name,
                    display_folder: text_field(column, "displayFolder"),
                });
            }
        }
    }

    structure
}

/// Tabular schemas come in both camelCase and PascalCase spellings depending
/// on the exporting tool.
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    if let Some(found) = object.get(key) {
        return Some(found);
    }
    let pascal = pascalize(key);
    object.get(&pascal)
}

fn pascalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    field(value, key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn array_field<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    field(value, key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// Expressions appear as plain strings or as line arrays in exported schemas.
fn expression_text(measure: &Value) -> Option<String> {
    match field(measure, "expression") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(lines)) => Some(
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Sidecar metadata next to the source: `metadata.json`,
/// `<stem>.metadata.json`. Absent or unreadable sidecars fall back to a
/// marker payload so the pipeline always has something to classify against.
pub fn load_metadata_for_source(source: &Path) -> Map<String, Value> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(parent) = source.parent() {
        candidates.push(parent.join("metadata.json"));
        if let Some(stem) = source.file_stem().and_then(|s| s.to_str()) {
            candidates.push(parent.join(format!("{stem}.metadata.json")));
        }
    }

    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }
        if let Ok(content) = std::fs::read_to_string(&candidate)
            && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&content)
        {
            return map;
        }
    }

    let mut fallback = Map::new();
    fallback.insert(
        "source".to_string(),
        Value::String(
            source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    );
    fallback.insert("metadata".to_string(), Value::String("missing".to_string()));
    fallback
}
