// ─── Fabric Loader Profile ───

use serde::Deserialize;

use super::version_file::{Library, LibraryArtifact, LibraryDownloads};
use crate::core::error::SyncResult;
use crate::core::maven::{MavenArtifact, FABRIC_MAVEN};

/// A Fabric loader launch profile layered over a vanilla version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricProfile {
    pub id: String,
    pub inherits_from: String,
    pub main_class: String,
    #[serde(default)]
    pub arguments: FabricArguments,
    #[serde(default)]
    pub libraries: Vec<FabricLibrary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FabricArguments {
    #[serde(default)]
    pub game: Vec<String>,
    #[serde(default)]
    pub jvm: Vec<String>,
}

/// Maven coordinate plus the repository it is served from.
#[derive(Debug, Clone, Deserialize)]
pub struct FabricLibrary {
    pub name: String,
    /// Repository base; the Fabric maven when absent.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl FabricProfile {
    pub fn from_slice(bytes: &[u8]) -> SyncResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl FabricLibrary {
    /// Resolve to a plain, ungated library artifact.
    pub fn to_library(&self) -> SyncResult<Library> {
        let coordinate = MavenArtifact::parse(&self.name)?;
        let repository = if self.url.is_empty() {
            FABRIC_MAVEN
        } else {
            self.url.as_str()
        };

        Ok(Library {
            name: self.name.clone(),
            downloads: LibraryDownloads {
                artifact: Some(LibraryArtifact {
                    path: coordinate.relative_path(),
                    sha1: self.sha1.clone().unwrap_or_default(),
                    size: self.size.unwrap_or_default(),
                    url: coordinate.url(repository),
                }),
                classifiers: Default::default(),
            },
            rules: Vec::new(),
        })
    }
}
