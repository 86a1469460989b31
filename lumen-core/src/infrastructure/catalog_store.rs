// lumen-core/src/infrastructure/catalog_store.rs

use crate::domain::standards::{build_catalog, LegacyStandardsConfig, RuleCatalog};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Persistence for the canonical rule catalog and its legacy input.
///
/// The catalog file is the authoritative artifact consumed by reviews; the
/// legacy config is the hand-maintained standards document it is generated
/// from. The sync path keeps the two aligned.
pub struct CatalogStore {
    catalog_path: PathBuf,
    legacy_path: PathBuf,
}

/// Outcome of `sync --check`, with machine-readable reason codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SyncStatus {
    InSync { rules: usize },
    CatalogMissing,
    CatalogOutdated,
}

impl SyncStatus {
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::InSync { .. } => None,
            Self::CatalogMissing => Some("catalog_missing"),
            Self::CatalogOutdated => Some("catalog_outdated"),
        }
    }
}

impl CatalogStore {
    pub fn new(catalog_path: PathBuf, legacy_path: PathBuf) -> Self {
        Self {
            catalog_path,
            legacy_path,
        }
    }

    pub fn catalog_path(&self) -> &PathBuf {
        &self.catalog_path
    }

    /// Legacy standards config, or `None` when the file does not exist.
    /// A present-but-malformed file is an error, not an empty config.
    #[instrument(skip(self), fields(path = %self.legacy_path.display()))]
    pub fn load_legacy_config(&self) -> Result<Option<LegacyStandardsConfig>, InfrastructureError> {
        if !self.legacy_path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.legacy_path)?;
        let config = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    /// Builds a fresh catalog from the legacy config. A missing legacy file
    /// yields the empty catalog rather than an error.
    pub fn build_from_legacy(&self) -> Result<RuleCatalog, InfrastructureError> {
        match self.load_legacy_config()? {
            Some(config) => {
                let source = Some(self.legacy_path.to_string_lossy().into_owned());
                Ok(build_catalog(&config, source))
            }
            None => {
                warn!("legacy standards config not found, building empty catalog");
                Ok(RuleCatalog::empty())
            }
        }
    }

    /// Catalog exactly as persisted; `CatalogNotFound` when absent.
    pub fn read_catalog(&self) -> Result<RuleCatalog, InfrastructureError> {
        if !self.catalog_path.is_file() {
            return Err(InfrastructureError::CatalogNotFound(
                self.catalog_path.clone(),
            ));
        }
        let content = std::fs::read_to_string(&self.catalog_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Catalog for review runs: the persisted file when present, otherwise a
    /// fresh build from the legacy config, otherwise empty. Never an error
    /// for a missing file on either side.
    #[instrument(skip(self))]
    pub fn load_catalog(&self) -> Result<RuleCatalog, InfrastructureError> {
        if self.catalog_path.is_file() {
            return self.read_catalog();
        }
        self.build_from_legacy()
    }

    pub fn write_catalog(&self, catalog: &RuleCatalog) -> Result<(), InfrastructureError> {
        fs::write_json(&self.catalog_path, catalog)?;
        info!(
            rules = catalog.rule_count,
            path = %self.catalog_path.display(),
            "catalog written"
        );
        Ok(())
    }

    /// Regenerates the persisted catalog. When the legacy config is gone the
    /// existing catalog is kept as-is, matching the check path.
    pub fn sync(&self) -> Result<RuleCatalog, InfrastructureError> {
        let catalog = if self.legacy_path.is_file() {
            self.build_from_legacy()?
        } else {
            self.load_catalog()?
        };
        self.write_catalog(&catalog)?;
        Ok(catalog)
    }

    /// Compares the persisted catalog against a fresh build, ignoring the
    /// `version` timestamp.
    #[instrument(skip(self))]
    pub fn check_sync(&self) -> Result<SyncStatus, InfrastructureError> {
        if !self.catalog_path.is_file() {
            return Ok(SyncStatus::CatalogMissing);
        }

        let expected = if self.legacy_path.is_file() {
            self.build_from_legacy()?
        } else {
            self.read_catalog()?
        };
        let existing = self.read_catalog()?;

        if existing.normalized() != expected.normalized() {
            return Ok(SyncStatus::CatalogOutdated);
        }

        Ok(SyncStatus::InSync {
            rules: expected.rule_count,
        })
    }
}

// --- UNIT TESTS ---
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs as stdfs;
    use tempfile::tempdir;

    const LEGACY: &str = r#"{
        "DAX_Templates": {
            "naming": {
                "measures": "snake_case",
                "columns": "PascalCase",
                "folders": ["Sales KPIs"]
            }
        }
    }"#;

    fn store(dir: &std::path::Path) -> CatalogStore {
        CatalogStore::new(dir.join("standards_catalog.json"), dir.join("standards_mcp.json"))
    }

    #[test]
    fn test_missing_legacy_builds_empty_catalog() -> Result<()> {
        let dir = tempdir()?;
        let catalog = store(dir.path()).build_from_legacy()?;
        assert_eq!(catalog.rules.len(), 0);
        Ok(())
    }

    #[test]
    fn test_sync_writes_catalog_and_check_passes() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        stdfs::write(dir.path().join("standards_mcp.json"), LEGACY)?;

        let catalog = store.sync()?;
        assert!(store.catalog_path().is_file());
        assert!(catalog.rule_count > 0);

        assert_eq!(
            store.check_sync()?,
            SyncStatus::InSync {
                rules: catalog.rule_count
            }
        );
        Ok(())
    }

    #[test]
    fn test_check_reports_missing_catalog() -> Result<()> {
        let dir = tempdir()?;
        let status = store(dir.path()).check_sync()?;
        assert_eq!(status, SyncStatus::CatalogMissing);
        assert_eq!(status.reason(), Some("catalog_missing"));
        Ok(())
    }

    #[test]
    fn test_check_reports_outdated_catalog() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        stdfs::write(dir.path().join("standards_mcp.json"), LEGACY)?;
        store.sync()?;

        // Legacy standards change after the catalog was generated.
        let updated = LEGACY.replace("Sales KPIs", "Finance KPIs");
        stdfs::write(dir.path().join("standards_mcp.json"), updated)?;

        let status = store.check_sync()?;
        assert_eq!(status, SyncStatus::CatalogOutdated);
        assert_eq!(status.reason(), Some("catalog_outdated"));
        Ok(())
    }

    #[test]
    fn test_load_catalog_prefers_persisted_file() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        stdfs::write(dir.path().join("standards_mcp.json"), LEGACY)?;
        let written = store.sync()?;

        let loaded = store.load_catalog()?;
        assert_eq!(loaded.normalized(), written.normalized());
        Ok(())
    }

    #[test]
    fn test_malformed_legacy_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = store(dir.path());
        stdfs::write(dir.path().join("standards_mcp.json"), "{broken")?;

        assert!(store.load_legacy_config().is_err());
        Ok(())
    }
}
