// lumen-core/src/domain/model.rs

use serde::{Deserialize, Serialize};

/// Extracted snapshot of one BI artifact. Built once per pipeline run,
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStructure {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub table: Option<String>,
    pub name: String,
    #[serde(default)]
    pub display_folder: Option<String>,
    #[serde(default)]
    pub format_string: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub table: Option<String>,
    pub name: String,
    #[serde(default)]
    pub display_folder: Option<String>,
}

/// Counts shown in the result envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSummary {
    pub tables: usize,
    pub measures: usize,
    pub columns: usize,
}

impl ModelStructure {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.measures.is_empty() && self.columns.is_empty()
    }

    pub fn summary(&self) -> StructureSummary {
        StructureSummary {
            tables: self.tables.len(),
            measures: self.measures.len(),
            columns: self.columns.len(),
        }
    }
}
