// lumen-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Write content to a file atomically using a temporary file.
///
/// The temporary file is created in the target's directory so the final
/// rename stays on one filesystem. The target is either fully written or
/// untouched; readers never observe a partial artifact.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty-printed JSON artifact, written atomically.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(payload)?;
    atomic_write(path, content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("report.txt");

        atomic_write(&file_path, "review complete")?;

        assert_eq!(fs::read_to_string(file_path)?, "review complete");
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("report.txt");

        atomic_write(&file_path, "first pass")?;
        atomic_write(&file_path, "second pass")?;

        assert_eq!(fs::read_to_string(file_path)?, "second pass");
        Ok(())
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("nested/deep/report.txt");

        atomic_write(&file_path, "ok")?;

        assert!(file_path.exists());
        Ok(())
    }

    #[test]
    fn test_write_json_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("payload.json");
        let payload = serde_json::json!({"status": "ok", "count": 3});

        write_json(&file_path, &payload)?;

        let loaded: serde_json::Value = serde_json::from_str(&fs::read_to_string(file_path)?)?;
        assert_eq!(loaded, payload);
        Ok(())
    }
}
