// ─── Version File ───
// Parses an upstream version JSON: client download, libraries with their
// rules and native classifiers, argument templates and runtime component.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::SyncResult;
use crate::core::http::fetch_json;
use crate::core::pack::{Argument, ManifestArguments};
use crate::core::rules::Rule;

/// A fully parsed upstream version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub downloads: VersionDownloads,
    pub asset_index: AssetIndexInfo,
    #[serde(default)]
    pub arguments: Option<ManifestArguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default)]
    pub component: Option<String>,
    pub major_version: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Library Entry ───

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub downloads: LibraryDownloads,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, LibraryArtifact>,
}

/// A downloadable library jar and where it lands under `libraries/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryArtifact {
    pub path: String,
    /// Empty when the publisher did not advertise one.
    #[serde(default)]
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

impl VersionJson {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> SyncResult<Self> {
        fetch_json(client, url).await
    }

    /// Managed runtime component requested by this version, if any.
    pub fn runtime_component(&self) -> Option<&str> {
        self.java_version
            .as_ref()
            .and_then(|j| j.component.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Argument templates, converting the legacy space-separated string into
    /// literal game arguments when no structured arguments exist.
    pub fn argument_templates(&self) -> ManifestArguments {
        if let Some(arguments) = &self.arguments {
            return arguments.clone();
        }

        ManifestArguments {
            game: self
                .minecraft_arguments
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(Argument::from)
                .collect(),
            jvm: Vec::new(),
        }
    }
}
