//! Snapshot file helpers shared by the local stores

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Resolve (and create) the app's data directory.
pub fn default_data_dir() -> Result<PathBuf, String> {
    let dir = dirs::data_dir()
        .ok_or_else(|| "No data directory available on this platform".to_string())?
        .join("limber");
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create data dir {}: {}", dir.display(), e))?;
    Ok(dir)
}

/// Load a snapshot file, falling back to the default value.
///
/// A missing file is the normal first-launch case. An unreadable or corrupt
/// file is logged and treated the same way; the store starts empty rather
/// than failing app startup.
pub fn load_snapshot<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Corrupt snapshot {}: {}", path.display(), e);
            T::default()
        }
    }
}

/// Serialize the full collection and replace the snapshot file.
///
/// Writes to a sibling temp file and renames over the target so a crash
/// mid-write never leaves a truncated snapshot behind.
pub fn save_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string(value)
        .map_err(|e| format!("Failed to serialize {}: {}", path.display(), e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        items: Vec<u32>,
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");

        let sample = Sample { items: vec![1, 2, 3] };
        save_snapshot(&path, &sample).unwrap();
        assert_eq!(load_snapshot::<Sample>(&path), sample);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(load_snapshot::<Sample>(&path), Sample::default());
    }

    #[test]
    fn test_corrupt_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_snapshot::<Sample>(&path), Sample::default());
    }
}
