// ─── Managed Runtime Metadata ───
// The upstream catalog of Java runtime components per platform and the
// per-platform file listing of one runtime release.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::version_file::DownloadArtifact;
use crate::core::error::{SyncError, SyncResult};
use crate::core::http::fetch_json;
use crate::core::rules::Platform;

/// `platform key -> component -> releases`, e.g. `linux -> java-runtime-gamma`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuntimeCatalog {
    pub platforms: BTreeMap<String, BTreeMap<String, Vec<RuntimeRelease>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeRelease {
    pub manifest: DownloadArtifact,
    #[serde(default)]
    pub version: Option<RuntimeVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeVersion {
    pub name: String,
    #[serde(default)]
    pub released: Option<String>,
}

impl RuntimeCatalog {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> SyncResult<Self> {
        fetch_json(client, url).await
    }

    /// First listed release of `component` for `platform`.
    pub fn find(&self, platform: Platform, component: &str) -> SyncResult<&RuntimeRelease> {
        self.platforms
            .get(platform.runtime_catalog_key())
            .and_then(|components| components.get(component))
            .and_then(|releases| releases.first())
            .ok_or_else(|| SyncError::RuntimeNotFound {
                component: component.to_string(),
                platform: platform.to_string(),
            })
    }
}

/// File listing of one runtime release, keyed by path inside the runtime root.
#[derive(Debug, Clone, Deserialize)]
pub struct JavaRuntimeManifest {
    pub files: BTreeMap<String, RuntimeFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeFile {
    #[serde(rename = "type")]
    pub kind: RuntimeFileKind,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub downloads: Option<RuntimeDownloads>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFileKind {
    File,
    Directory,
    Link,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeDownloads {
    pub raw: DownloadArtifact,
}

impl JavaRuntimeManifest {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> SyncResult<Self> {
        fetch_json(client, url).await
    }

    /// Regular files with a raw download, in path order.
    pub fn downloadable_files(
        &self,
    ) -> impl Iterator<Item = (&str, &RuntimeFile, &DownloadArtifact)> {
        self.files.iter().filter_map(|(path, file)| {
            if file.kind != RuntimeFileKind::File {
                return None;
            }
            file.downloads
                .as_ref()
                .map(|d| (path.as_str(), file, &d.raw))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_uses_platform_keys() {
        let catalog: RuntimeCatalog = serde_json::from_value(serde_json::json!({
            "gamecore": {},
            "mac-os-arm64": {
                "java-runtime-gamma": [{
                    "availability": {"group": 1, "progress": 100},
                    "manifest": {"sha1": "aa", "size": 10, "url": "https://example.com/gamma.json"},
                    "version": {"name": "17.0.8", "released": "2023-07-25T00:00:00+00:00"}
                }]
            }
        }))
        .unwrap();

        let release = catalog.find(Platform::MacosArm, "java-runtime-gamma").unwrap();
        assert_eq!(release.manifest.url, "https://example.com/gamma.json");
        assert!(matches!(
            catalog.find(Platform::Linux, "java-runtime-gamma"),
            Err(SyncError::RuntimeNotFound { .. })
        ));
    }

    #[test]
    fn only_regular_files_are_downloadable() {
        let manifest: JavaRuntimeManifest = serde_json::from_value(serde_json::json!({
            "files": {
                "bin": {"type": "directory"},
                "bin/java": {
                    "type": "file",
                    "executable": true,
                    "downloads": {
                        "lzma": {"sha1": "cc", "size": 1, "url": "https://example.com/java.lzma"},
                        "raw": {"sha1": "bb", "size": 2, "url": "https://example.com/java"}
                    }
                },
                "lib/libjli.so": {"type": "link", "target": "../libjli.so"}
            }
        }))
        .unwrap();

        let files: Vec<_> = manifest.downloadable_files().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "bin/java");
        assert!(files[0].1.executable);
        assert_eq!(files[0].2.sha1, "bb");
    }
}
