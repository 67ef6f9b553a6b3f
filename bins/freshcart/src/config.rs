//! Settings file loading
//!
//! ```toml
//! [search]
//! max_radius_km = 5.0
//! weight_preset = "balanced"
//!
//! [search.weights]
//! proximity_weight = 0.5
//! freshness_weight = 0.5
//!
//! [telemetry]
//! log_level = "debug"
//! json = true
//! ```

use anyhow::Context;
use freshcart_search::SearchConfigInput;
use freshcart_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file locations tried when `--config` is not given
const CANDIDATES: &[&str] = &["freshcart.toml", ".freshcart.toml", ".config/freshcart.toml"];

/// Contents of a settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchConfigInput,
    pub telemetry: TelemetryConfig,
}

/// Settings plus where they came from
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Load from an explicit path, else the first standard location that
    /// exists under `dir`, else defaults.
    pub fn load(path: Option<&Path>, dir: &Path) -> anyhow::Result<LoadedSettings> {
        let settings_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_settings_file(dir),
        };

        let settings = match settings_path {
            Some(ref p) => load_settings_file(p)?,
            None => Settings::default(),
        };

        Ok(LoadedSettings {
            settings,
            path: settings_path,
        })
    }
}

fn find_settings_file(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|candidate| candidate.is_file())
}

/// Read and parse one settings file
pub fn load_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(None, dir.path()).unwrap();
        assert!(loaded.path.is_none());
        assert_eq!(loaded.settings.search, SearchConfigInput::default());
        assert_eq!(loaded.settings.telemetry.log_level, "warn");
    }

    #[test]
    fn test_discovers_standard_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".config")).unwrap();
        std::fs::write(
            dir.path().join(".config/freshcart.toml"),
            "[search]\nmax_radius_km = 3.5\nmode = \"filter\"\n",
        )
        .unwrap();

        let loaded = Settings::load(None, dir.path()).unwrap();
        assert_eq!(loaded.path, Some(dir.path().join(".config/freshcart.toml")));
        assert_eq!(loaded.settings.search.max_radius_km, Some(3.5));
        assert_eq!(loaded.settings.search.mode.as_deref(), Some("filter"));
    }

    #[test]
    fn test_nested_weights_and_telemetry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[search.weights]\nproximity_weight = 0.8\n\n[telemetry]\njson = true\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path), dir.path()).unwrap().settings;
        let weights = settings.search.weights.unwrap();
        assert_eq!(weights.proximity_weight, Some(0.8));
        assert_eq!(weights.freshness_weight, None);
        assert!(settings.telemetry.json);
    }

    #[test]
    fn test_partial_telemetry_table_keeps_default_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freshcart.toml");
        std::fs::write(&path, "[telemetry]\nshow_target = true\n").unwrap();

        let settings = Settings::load(Some(&path), dir.path()).unwrap().settings;
        assert!(settings.telemetry.show_target);
        assert_eq!(settings.telemetry.log_level, "warn");
        assert_eq!(
            settings.telemetry.log_level,
            Settings::default().telemetry.log_level
        );
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read settings file"));
    }

    #[test]
    fn test_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freshcart.toml");
        std::fs::write(&path, "[search]\nmax_radius_km = \"far\"\n").unwrap();
        let err = Settings::load(None, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse settings file"));
    }
}
