//! Durable per-install device identity

use std::path::Path;

use uuid::Uuid;

const DEVICE_ID_FILE: &str = "device_id";

/// Load the install's device id, generating and persisting one on first use.
///
/// Anonymous completions are attributed to this id, so it must survive
/// restarts; if the file cannot be written the generated id is still used
/// for this session and attribution resets on the next launch.
pub fn load_or_create_device_id(dir: &Path) -> Uuid {
    let path = dir.join(DEVICE_ID_FILE);

    if let Ok(raw) = std::fs::read_to_string(&path) {
        if let Ok(id) = raw.trim().parse::<Uuid>() {
            return id;
        }
        log::warn!("Unparseable device id in {}, regenerating", path.display());
    }

    let id = Uuid::new_v4();
    if let Err(e) = std::fs::write(&path, id.to_string()) {
        log::warn!("Failed to persist device id to {}: {}", path.display(), e);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_is_stable_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_create_device_id(dir.path());
        let second = load_or_create_device_id(dir.path());
        assert_eq!(first, second);
    }

    #[test]
    fn test_garbage_file_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEVICE_ID_FILE), "not-a-uuid").unwrap();
        let id = load_or_create_device_id(dir.path());
        let again = load_or_create_device_id(dir.path());
        assert_eq!(id, again);
    }
}
