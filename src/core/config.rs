// ─── Configuration ───
// Persisted sync settings, upstream endpoints and game folder locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::{KeepSet, DEFAULT_KEEP_PATTERNS};

pub const SETTINGS_FILE: &str = "packsync_settings.json";
const APP_DIR_NAME: &str = "packsync";
const PACKS_DIR: &str = "packs";

/// Upstream metadata locations used by the generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest_url: String,
    pub runtime_manifest_url: String,
    pub resources_base_url: String,
}

const VERSION_MANIFEST_URL: &str = "https://piston-meta.mojang.com/mc/game/version_manifest.json";
const RUNTIME_MANIFEST_URL: &str = "https://launchermeta.mojang.com/v1/products/java-runtime/\
                                    2ec0cc96c44e5a76b9c8b7c39df7210883d12871/all.json";
const RESOURCES_BASE_URL: &str = "https://resources.download.minecraft.net";

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest_url: VERSION_MANIFEST_URL.into(),
            runtime_manifest_url: RUNTIME_MANIFEST_URL.into(),
            resources_base_url: RESOURCES_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Glob patterns (relative to the folder root) that survive reconciliation.
    pub keep_patterns: Vec<String>,
    /// Upper bound on concurrent fetches; host parallelism when unset.
    pub max_workers: Option<usize>,
    pub endpoints: Endpoints,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            keep_patterns: DEFAULT_KEEP_PATTERNS.iter().map(|p| p.to_string()).collect(),
            max_workers: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl SyncSettings {
    /// Settings stored in `dir`, or the defaults when missing or unreadable.
    pub fn load_from(dir: &Path) -> Self {
        let path = dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No settings at {:?}, using defaults", path);
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt settings at {:?}: {}", path, e);
            Self::default()
        })
    }

    pub fn save_to(&self, dir: &Path) -> SyncResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
        let path = dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| SyncError::io(&path, e))
    }

    /// KeepSet compiled from `keep_patterns`.
    pub fn keep_set(&self) -> SyncResult<KeepSet> {
        let mut keep = KeepSet::new();
        for pattern in &self.keep_patterns {
            keep.keep_glob(pattern)?;
        }
        Ok(keep)
    }
}

/// Per-user directory the settings file lives in.
pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Where a game folder named `folder_name` lives for the current user:
/// `~/Library/Application Support/<name>` on macOS, `%APPDATA%\<name>` on
/// Windows, `~/.<name>` elsewhere.
pub fn game_folder_path(folder_name: &str) -> SyncResult<PathBuf> {
    let missing = |what: &str| {
        SyncError::Other(format!("cannot resolve the {what} directory for {folder_name}"))
    };

    if cfg!(any(target_os = "macos", target_os = "windows")) {
        dirs::data_dir()
            .map(|dir| dir.join(folder_name))
            .ok_or_else(|| missing("data"))
    } else {
        dirs::home_dir()
            .map(|home| home.join(format!(".{folder_name}")))
            .ok_or_else(|| missing("home"))
    }
}

/// `<root>/packs/<name>`, the working directory a pack is generated into.
pub fn pack_dir(root: &Path, pack_name: &str) -> PathBuf {
    root.join(PACKS_DIR).join(pack_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_corrupt_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(SyncSettings::load_from(dir.path()), SyncSettings::default());

        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert_eq!(SyncSettings::load_from(dir.path()), SyncSettings::default());
    }

    #[test]
    fn settings_survive_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SyncSettings {
            keep_patterns: vec!["saves/*".into()],
            max_workers: Some(3),
            endpoints: Endpoints {
                resources_base_url: "http://127.0.0.1:9000/objects".into(),
                ..Endpoints::default()
            },
        };

        settings.save_to(&dir.path().join("nested")).unwrap();
        assert_eq!(SyncSettings::load_from(&dir.path().join("nested")), settings);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), r#"{"max_workers": 2}"#).unwrap();

        let settings = SyncSettings::load_from(dir.path());
        assert_eq!(settings.max_workers, Some(2));
        assert_eq!(settings.keep_patterns.len(), DEFAULT_KEEP_PATTERNS.len());
        assert_eq!(settings.endpoints, Endpoints::default());
    }

    #[test]
    fn keep_set_is_built_from_patterns() {
        let settings = SyncSettings::default();
        let keep = settings.keep_set().unwrap();
        assert!(keep.matches("logs/latest.log", Path::new("/g/logs/latest.log")));

        let broken = SyncSettings {
            keep_patterns: vec!["[".into()],
            ..SyncSettings::default()
        };
        assert!(matches!(broken.keep_set(), Err(SyncError::InvalidPattern { .. })));
    }

    #[test]
    fn folder_locations() {
        assert_eq!(pack_dir(Path::new("/work"), "demo"), PathBuf::from("/work/packs/demo"));

        let path = game_folder_path("demo").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            assert_eq!(name, "demo");
        } else {
            assert_eq!(name, ".demo");
        }
    }
}
