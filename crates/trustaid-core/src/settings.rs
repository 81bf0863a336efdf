//! Process-wide client settings, persisted through [`PrefStore`].

use anyhow::Result;

use crate::pipeline::Pipeline;
use crate::prefs::PrefStore;

pub const KEY_API_BASE: &str = "trustaid.apiBase";
pub const KEY_DEMO_MODE: &str = "trustaid.demo";
pub const KEY_PIPELINE: &str = "trustaid.pipeline";

/// Environment variable supplying the default backend origin.
pub const API_BASE_ENV: &str = "TRUSTAID_API_BASE";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub demo_mode: bool,
    pub pipeline: Pipeline,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            demo_mode: false,
            pipeline: Pipeline::Auto,
        }
    }
}

/// Backend origin from the environment, or the local default.
pub fn default_api_base() -> String {
    std::env::var(API_BASE_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

impl Settings {
    pub fn load(store: &PrefStore) -> Self {
        let defaults = Self::default();
        Self {
            api_base: store.get(KEY_API_BASE, defaults.api_base),
            demo_mode: store.get(KEY_DEMO_MODE, defaults.demo_mode),
            pipeline: store.get(KEY_PIPELINE, defaults.pipeline),
        }
    }

    pub fn set_api_base(&mut self, store: &mut PrefStore, api_base: &str) -> Result<()> {
        let api_base = api_base.trim().trim_end_matches('/').to_string();
        store.set(KEY_API_BASE, &api_base)?;
        self.api_base = api_base;
        Ok(())
    }

    pub fn set_demo_mode(&mut self, store: &mut PrefStore, demo_mode: bool) -> Result<()> {
        store.set(KEY_DEMO_MODE, &demo_mode)?;
        self.demo_mode = demo_mode;
        Ok(())
    }

    pub fn set_pipeline(&mut self, store: &mut PrefStore, pipeline: Pipeline) -> Result<()> {
        store.set(KEY_PIPELINE, &pipeline)?;
        self.pipeline = pipeline;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_changes_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PrefStore::at(&path);
        let mut settings = Settings::load(&store);
        settings.set_api_base(&mut store, "https://api.example.org/").unwrap();
        settings.set_demo_mode(&mut store, true).unwrap();
        settings.set_pipeline(&mut store, Pipeline::Trustbot).unwrap();

        let reloaded = Settings::load(&PrefStore::at(&path));
        assert_eq!(reloaded.api_base, "https://api.example.org");
        assert!(reloaded.demo_mode);
        assert_eq!(reloaded.pipeline, Pipeline::Trustbot);
    }

    #[test]
    fn test_pipeline_stored_as_json_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PrefStore::at(&path);
        let mut settings = Settings::load(&store);
        settings.set_pipeline(&mut store, Pipeline::Navigator).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""trustaid.pipeline": "\"navigator\"""#));
    }

    #[test]
    fn test_unknown_pipeline_falls_back_to_auto() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"trustaid.pipeline": "\"sql\""}"#).unwrap();

        let settings = Settings::load(&PrefStore::at(&path));
        assert_eq!(settings.pipeline, Pipeline::Auto);
    }
}
