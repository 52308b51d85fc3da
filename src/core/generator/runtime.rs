use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tracing::{debug, info};

use super::{fetch_verified, GenerateContext, PackBuilder};
use crate::core::checksum::ChecksumKind;
use crate::core::error::SyncResult;
use crate::core::pack::{join_path, FileCategory, FileEntry, RUNTIME_DIR};
use crate::core::rules::Platform;
use crate::core::version::{DownloadArtifact, JavaRuntimeManifest, RuntimeCatalog, RuntimeFile};

/// A managed runtime component for every platform at once; each entry is
/// gated to the platform it belongs to.
pub struct RuntimeBuilder {
    component: String,
    manifests: Vec<(Platform, JavaRuntimeManifest)>,
}

impl RuntimeBuilder {
    /// Look `component` up for every platform and fetch the file listings.
    pub async fn resolve(
        client: &reqwest::Client,
        catalog: &RuntimeCatalog,
        component: &str,
    ) -> SyncResult<Self> {
        let manifests = try_join_all(Platform::ALL.into_iter().map(|platform| async move {
            let release = catalog.find(platform, component)?;
            let raw = fetch_verified(client, &release.manifest.url, &release.manifest.sha1).await?;
            let manifest: JavaRuntimeManifest = serde_json::from_slice(&raw)?;
            debug!("{} for {} lists {} entries", component, platform, manifest.files.len());
            Ok::<_, crate::core::error::SyncError>((platform, manifest))
        }))
        .await?;

        Ok(Self::from_manifests(component, manifests))
    }

    pub fn from_manifests(
        component: impl Into<String>,
        manifests: Vec<(Platform, JavaRuntimeManifest)>,
    ) -> Self {
        Self {
            component: component.into(),
            manifests,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Executable path per platform that ships at least one file.
    pub fn runtime_binaries(&self) -> BTreeMap<Platform, String> {
        self.manifests
            .iter()
            .filter(|(_, manifest)| manifest.downloadable_files().next().is_some())
            .map(|(platform, _)| (*platform, platform.runtime_binary()))
            .collect()
    }

    fn files(&self) -> impl Iterator<Item = (Platform, String, &RuntimeFile, &DownloadArtifact)> {
        self.manifests.iter().flat_map(|(platform, manifest)| {
            manifest.downloadable_files().map(move |(key, file, raw)| {
                let path = join_path(&[RUNTIME_DIR, platform.as_str(), key]);
                (*platform, path, file, raw)
            })
        })
    }
}

#[async_trait]
impl PackBuilder for RuntimeBuilder {
    type Output = Vec<FileEntry>;

    async fn filter_elements(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>> {
        let mut pending = Vec::new();
        for (_, path, _, raw) in self.files() {
            if !ctx
                .connector
                .has_file_with_checksum(&path, ChecksumKind::Sha1, &raw.sha1)
                .await
            {
                pending.push(path);
            }
        }
        Ok(pending)
    }

    async fn download(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<FileEntry>> {
        let pending: HashSet<String> = self.filter_elements(ctx).await?.into_iter().collect();
        let total = pending.len();
        info!("Runtime {}: {} files to download", self.component, total);

        let mut entries = Vec::new();
        let mut done = 0;
        for (platform, path, file, raw) in self.files() {
            let entry = FileEntry::new(
                path.as_str(),
                raw.size,
                raw.sha1.as_str(),
                FileCategory::Runtime,
            )
            .with_rules(Some(platform.create_rules()))
            .with_executable(file.executable);

            if pending.contains(&path) {
                let bytes = fetch_verified(ctx.client, &raw.url, &raw.sha1).await?;
                ctx.connector
                    .send_file_from_bytes(&path, &bytes, Some(entry.mode()))
                    .await?;
                done += 1;
                ctx.progress.report("Downloading runtime", done, total, &path);
            }

            entries.push(entry);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::sha1_hex;
    use crate::core::generator::testing::Fixture;
    use crate::core::rules::{should_include, Environment};

    fn listing(fixture: &Fixture, java: &[u8]) -> JavaRuntimeManifest {
        serde_json::from_value(serde_json::json!({
            "files": {
                "bin": {"type": "directory"},
                "bin/java": {
                    "type": "file",
                    "executable": true,
                    "downloads": {"raw": {
                        "sha1": sha1_hex(java),
                        "size": java.len(),
                        "url": fixture.url("/rt/java")
                    }}
                },
                "lib/jvm.cfg": {
                    "type": "file",
                    "executable": false,
                    "downloads": {"raw": {
                        "sha1": sha1_hex(b"cfg"),
                        "size": 3,
                        "url": fixture.url("/rt/jvm.cfg")
                    }}
                },
                "bin/jjs": {"type": "link", "target": "java"}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fans_out_per_platform_with_rules() {
        let fixture = Fixture::new().await;
        fixture.serve("/rt/java", b"elf".to_vec(), 2).await;
        fixture.serve("/rt/jvm.cfg", b"cfg".to_vec(), 2).await;

        let builder = RuntimeBuilder::from_manifests(
            "java-runtime-gamma",
            vec![
                (Platform::Linux, listing(&fixture, b"elf")),
                (Platform::MacosArm, listing(&fixture, b"elf")),
            ],
        );
        let entries = builder.download(&fixture.ctx()).await.unwrap();

        assert_eq!(entries.len(), 4);
        let java = entries
            .iter()
            .find(|e| e.path == "runtime/linux/bin/java")
            .unwrap();
        assert!(java.executable);
        assert!(should_include(java.rules(), &Environment::new(Platform::Linux, "x86_64")));
        assert!(!should_include(java.rules(), &Environment::new(Platform::MacosArm, "aarch64")));
        assert_eq!(fixture.read("runtime/macos-arm64/lib/jvm.cfg"), b"cfg");

        let binaries = builder.runtime_binaries();
        assert_eq!(binaries[&Platform::Linux], "runtime/linux/bin/java");
        assert_eq!(
            binaries[&Platform::MacosArm],
            "runtime/macos-arm64/jre.bundle/Contents/Home/bin/java"
        );
    }

    #[tokio::test]
    async fn files_already_stored_are_skipped() {
        let fixture = Fixture::new().await;
        fixture.serve("/rt/java", b"elf".to_vec(), 0).await;
        fixture.serve("/rt/jvm.cfg", b"cfg".to_vec(), 1).await;
        fixture.store("runtime/linux/bin/java", b"elf");

        let builder = RuntimeBuilder::from_manifests(
            "java-runtime-gamma",
            vec![(Platform::Linux, listing(&fixture, b"elf"))],
        );
        assert_eq!(
            builder.filter_elements(&fixture.ctx()).await.unwrap(),
            vec!["runtime/linux/lib/jvm.cfg".to_string()]
        );
        assert_eq!(builder.download(&fixture.ctx()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resolve_requires_every_platform() {
        let fixture = Fixture::new().await;
        let listing_json = serde_json::to_vec(&serde_json::json!({"files": {}})).unwrap();
        fixture.serve("/rt/manifest.json", listing_json.clone(), 6).await;

        let release = serde_json::json!([
            {"manifest": {
                "sha1": sha1_hex(&listing_json),
                "size": listing_json.len(),
                "url": fixture.url("/rt/manifest.json")
            }}
        ]);
        let mut catalog = serde_json::Map::new();
        for platform in Platform::ALL {
            catalog.insert(
                platform.runtime_catalog_key().to_string(),
                serde_json::json!({"java-runtime-gamma": release}),
            );
        }
        let catalog: RuntimeCatalog =
            serde_json::from_value(serde_json::Value::Object(catalog)).unwrap();

        let builder = RuntimeBuilder::resolve(&fixture.client, &catalog, "java-runtime-gamma")
            .await
            .unwrap();
        assert!(builder.runtime_binaries().is_empty());
        assert!(RuntimeBuilder::resolve(&fixture.client, &catalog, "jre-legacy").await.is_err());
    }
}
