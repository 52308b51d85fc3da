// ─── Version Manifest ───
// The upstream list of game versions and where their version JSONs live.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{SyncError, SyncResult};
use crate::core::http::fetch_json;

/// Top-level upstream version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> SyncResult<Self> {
        info!("Fetching version manifest from {}", url);
        let manifest: VersionManifest = fetch_json(client, url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn require_version(&self, id: &str) -> SyncResult<&VersionEntry> {
        self.find_version(id)
            .ok_or_else(|| SyncError::VersionNotFound(id.to_string()))
    }

    /// List all official stable versions (release only).
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "latest": {"release": "1.20.4", "snapshot": "24w03a"},
            "versions": [
                {"id": "24w03a", "type": "snapshot", "url": "https://example.com/24w03a.json"},
                {
                    "id": "1.20.4",
                    "type": "release",
                    "url": "https://example.com/1.20.4.json",
                    "sha1": "abc123"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn releases_skip_snapshots() {
        let manifest = manifest();
        let ids: Vec<&str> = manifest.releases().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1.20.4"]);
        assert_eq!(manifest.latest.unwrap().snapshot, "24w03a");
    }

    #[test]
    fn unknown_version_is_an_error() {
        let manifest = manifest();
        assert_eq!(manifest.require_version("1.20.4").unwrap().sha1.as_deref(), Some("abc123"));
        assert!(matches!(
            manifest.require_version("0.0.1"),
            Err(SyncError::VersionNotFound(id)) if id == "0.0.1"
        ));
    }
}
