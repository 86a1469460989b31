// lumen-core/src/infrastructure/profiles.rs

use crate::domain::ports::ProfileSource;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Filesystem adapter for domain profiles: one directory per profile key,
/// each holding a `metadata.json` with the domain's default metadata.
pub struct FsProfileSource {
    root: PathBuf,
}

impl FsProfileSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn read_profile(&self, key: &str) -> Option<Map<String, Value>> {
        let path = self.root.join(key).join("metadata.json");
        if !path.is_file() {
            return None;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Some(map),
            _ => {
                debug!(profile = key, "profile metadata is not a JSON object, ignored");
                None
            }
        }
    }
}

impl ProfileSource for FsProfileSource {
    fn load(&self, profile_key: &str) -> Option<Map<String, Value>> {
        if !self.root.is_dir() {
            return None;
        }

        // Legacy profile directories used several spellings for one key.
        let candidates = [
            profile_key.to_string(),
            profile_key.strip_prefix("case_").unwrap_or(profile_key).to_string(),
            profile_key.replace('-', "_"),
            profile_key.replace(' ', "_"),
        ];

        let mut seen: Vec<String> = Vec::new();
        for candidate in candidates {
            let normalized = candidate.trim().to_lowercase();
            if normalized.is_empty() || seen.contains(&normalized) {
                continue;
            }
            if let Some(profile) = self.read_profile(&normalized) {
                return Some(profile);
            }
            seen.push(normalized);
        }

        self.read_profile("default")
    }
}
