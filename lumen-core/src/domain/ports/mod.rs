// lumen-core/src/domain/ports/mod.rs

use serde_json::{Map, Value};

/// Source of curated per-domain default metadata ("profiles").
/// The classifier consults it after the primary domain is resolved; the
/// filesystem adapter lives in the infrastructure layer.
pub trait ProfileSource {
    /// Returns the profile metadata for a domain key, or `None` when no
    /// profile exists (including the shared default).
    fn load(&self, profile_key: &str) -> Option<Map<String, Value>>;
}

/// Profile source that never resolves anything. Used by tests and by callers
/// that run without a profile directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfiles;

impl ProfileSource for NoProfiles {
    fn load(&self, _profile_key: &str) -> Option<Map<String, Value>> {
        None
    }
}
