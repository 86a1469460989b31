// lumen-core/src/infrastructure/discovery.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Recursively discovers reviewable sources under the given targets.
///
/// Registered sources are `.pbip` bundle directories, `.pbip` files and
/// standalone `.json` models. JSON files nested inside a bundle belong to
/// that bundle and are not registered on their own. The result is
/// deduplicated by resolved path and ordered by the walk, which is sorted
/// per directory.
pub fn discover_sources(targets: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    let mut register = |candidate: &Path, sources: &mut Vec<PathBuf>| {
        let resolved = candidate
            .canonicalize()
            .unwrap_or_else(|_| candidate.to_path_buf());
        if seen.insert(resolved) {
            sources.push(candidate.to_path_buf());
        }
    };

    for target in targets {
        if target.is_dir() {
            if has_extension(target, "pbip") {
                register(target, &mut sources);
                continue;
            }

            for entry in WalkDir::new(target)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if entry.file_type().is_dir() {
                    if has_extension(path, "pbip") {
                        register(path, &mut sources);
                    }
                } else if entry.file_type().is_file() {
                    if has_extension(path, "pbip") {
                        register(path, &mut sources);
                    } else if has_extension(path, "json") && !inside_pbip_directory(path) {
                        register(path, &mut sources);
                    }
                }
            }
        } else if target.is_file()
            && (has_extension(target, "pbip") || has_extension(target, "json"))
        {
            register(target, &mut sources);
        }
    }

    debug!(count = sources.len(), "discovered sources");
    sources
}

fn inside_pbip_directory(path: &Path) -> bool {
    path.ancestors()
        .skip(1)
        .any(|ancestor| has_extension(ancestor, "pbip"))
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

// --- UNIT TESTS ---
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discovers_bundles_and_json_models() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("Sales.pbip"))?;
        fs::write(root.join("Sales.pbip/DataModelSchema.json"), "{}")?;
        fs::write(root.join("finance.json"), "{}")?;
        fs::write(root.join("readme.txt"), "ignored")?;

        let sources = discover_sources(&[root.to_path_buf()]);
        let names: Vec<_> = sources
            .iter()
            .map(|s| s.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["Sales.pbip", "finance.json"]);
        Ok(())
    }

    #[test]
    fn test_json_inside_bundle_not_registered_twice() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        let bundle = root.join("Sales.pbip");
        fs::create_dir_all(bundle.join("Sales.SemanticModel"))?;
        fs::write(bundle.join("Sales.SemanticModel/model.json"), "{}")?;

        let sources = discover_sources(&[root.to_path_buf()]);
        assert_eq!(sources.len(), 1);
        assert!(sources[0].ends_with("Sales.pbip"));
        Ok(())
    }

    #[test]
    fn test_direct_bundle_target() -> Result<()> {
        let dir = tempdir()?;
        let bundle = dir.path().join("HR.pbip");
        fs::create_dir_all(&bundle)?;

        let sources = discover_sources(&[bundle.clone()]);
        assert_eq!(sources, vec![bundle]);
        Ok(())
    }

    #[test]
    fn test_duplicate_targets_deduplicated() -> Result<()> {
        let dir = tempdir()?;
        let model = dir.path().join("model.json");
        fs::write(&model, "{}")?;

        let sources = discover_sources(&[model.clone(), model.clone()]);
        assert_eq!(sources.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_target_yields_nothing() {
        let sources = discover_sources(&[PathBuf::from("/nonexistent/path/xyz")]);
        assert!(sources.is_empty());
    }
}
