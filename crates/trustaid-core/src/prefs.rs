//! Durable key/value preferences.
//!
//! Entries live in one JSON file mapping string keys to JSON-encoded values,
//! so a single corrupt value cannot poison the others.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct PrefStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PrefStore {
    /// Open the store in the user's config directory.
    pub fn open() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    /// Open the store backed by `path`. A missing or unreadable file starts empty.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed preferences file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read `key`, falling back to `default` when absent or undecodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.entries
            .get(key)
            .and_then(|raw| match serde_json::from_str(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(key, error = %e, "stored preference is malformed");
                    None
                }
            })
            .unwrap_or(default)
    }

    /// Store `value` under `key` and write the file immediately.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.entries.insert(key.to_string(), encoded);
        self.save()
    }

    fn save(&self) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("trustaid").join("prefs.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_missing_returns_default() {
        let dir = tempdir().unwrap();
        let store = PrefStore::at(dir.path().join("prefs.json"));
        assert!(store.get("trustaid.demo", true));
    }

    #[test]
    fn test_set_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = PrefStore::at(&path);
        store.set("trustaid.apiBase", &"http://backend:8000").unwrap();

        let reopened = PrefStore::at(&path);
        assert_eq!(
            reopened.get("trustaid.apiBase", String::new()),
            "http://backend:8000"
        );
    }

    #[test]
    fn test_malformed_value_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"trustaid.demo": "not-json{", "trustaid.apiBase": "\"http://x\""}"#).unwrap();

        let store = PrefStore::at(&path);
        assert!(!store.get("trustaid.demo", false));
        assert_eq!(store.get("trustaid.apiBase", String::new()), "http://x");
    }

    #[test]
    fn test_wrong_type_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"trustaid.demo": "\"yes\""}"#).unwrap();

        let store = PrefStore::at(&path);
        assert!(store.get("trustaid.demo", true));
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "][").unwrap();

        let mut store = PrefStore::at(&path);
        assert!(!store.get("trustaid.demo", false));
        store.set("trustaid.demo", &true).unwrap();
        assert!(PrefStore::at(&path).get("trustaid.demo", false));
    }
}
