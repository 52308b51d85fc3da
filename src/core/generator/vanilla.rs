use tracing::info;

use super::assets::AssetsBuilder;
use super::client_jar::ClientJarBuilder;
use super::libraries::LibrariesBuilder;
use super::natives::NativesBuilder;
use super::runtime::RuntimeBuilder;
use super::{fetch_verified, GenerateContext, PackBuilder, UpstreamMetadata};
use crate::core::assets::FetchedAssetIndex;
use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::{Manifest, MANIFEST_FILE};
use crate::core::version::VersionJson;

/// Generates a pack for one upstream game version.
#[derive(Debug, Clone)]
pub struct VanillaGenerator {
    pub(super) pack_version: String,
    pub(super) version: VersionJson,
    asset_index: FetchedAssetIndex,
}

impl VanillaGenerator {
    /// Fetch the version JSON and asset index of `version_id`.
    pub async fn resolve(
        client: &reqwest::Client,
        upstream: &UpstreamMetadata,
        version_id: &str,
    ) -> SyncResult<Self> {
        info!("Resolving vanilla {}", version_id);
        let entry = upstream.versions.require_version(version_id)?;

        let sha1 = entry.sha1.as_deref().unwrap_or_default();
        let raw = fetch_verified(client, &entry.url, sha1).await?;
        let version: VersionJson = serde_json::from_slice(&raw)?;
        let asset_index = FetchedAssetIndex::fetch(client, &version.asset_index).await?;

        Ok(Self::from_parts(version_id, version, asset_index))
    }

    pub fn from_parts(
        pack_version: impl Into<String>,
        version: VersionJson,
        asset_index: FetchedAssetIndex,
    ) -> Self {
        Self {
            pack_version: pack_version.into(),
            version,
            asset_index,
        }
    }

    pub fn pack_version(&self) -> &str {
        &self.pack_version
    }

    pub fn version(&self) -> &VersionJson {
        &self.version
    }

    /// Run every stage against `ctx.connector`, then store `manifest.json`.
    pub async fn generate(&self, ctx: &GenerateContext<'_>) -> SyncResult<Manifest> {
        info!(
            "Generating pack {} (game {}) into {}",
            self.pack_version,
            self.version.id,
            ctx.connector.uri()
        );
        ctx.connector.connect().await?;

        let client = self.version.downloads.client.clone().ok_or_else(|| {
            SyncError::Other(format!("version {} has no client download", self.version.id))
        })?;
        let mut files = vec![ClientJarBuilder::new(client).download(ctx).await?];

        let mut runtime_binaries = Default::default();
        if let Some(component) = self.version.runtime_component() {
            let runtime =
                RuntimeBuilder::resolve(ctx.client, &ctx.upstream.runtimes, component).await?;
            let runtime_files = runtime.download(ctx).await?;
            info!("Runtime {}: {} files", component, runtime_files.len());
            if !runtime_files.is_empty() {
                runtime_binaries = runtime.runtime_binaries();
            }
            files.extend(runtime_files);
        }

        let assets = AssetsBuilder::new(self.asset_index.clone()).download(ctx).await?;
        info!("Assets: {} files", assets.len());
        files.extend(assets);

        let libraries = LibrariesBuilder::new(self.version.libraries.clone())
            .download(ctx)
            .await?;
        info!("Libraries: {} files", libraries.files.len());
        files.extend(libraries.files);

        let natives = NativesBuilder::new(libraries.natives).download(ctx).await?;
        info!("Natives: {} files", natives.len());
        files.extend(natives);

        let manifest = Manifest {
            main_class: self.version.main_class.clone(),
            version: self.pack_version.clone(),
            game_version: self.version.id.clone(),
            arguments: self.version.argument_templates(),
            asset_index: self.asset_index.id.clone(),
            runtime_binaries,
            files,
        };
        manifest.validate()?;

        ctx.connector
            .send_file_from_bytes(MANIFEST_FILE, &manifest.to_json_bytes()?, None)
            .await?;
        info!("Pack {} lists {} files", manifest.version, manifest.files.len());
        Ok(manifest)
    }
}
