// ─── Generator Pipeline ───
// Builds a pack from upstream metadata: client jar, managed runtime, assets,
// libraries and natives are stored through a connector and described by the
// manifest written last.

mod assets;
mod client_jar;
mod fabric;
mod libraries;
mod natives;
mod runtime;
mod vanilla;

use async_trait::async_trait;
use tracing::info;

use crate::core::checksum::verify_sha1;
use crate::core::config::Endpoints;
use crate::core::connectors::AnyConnector;
use crate::core::error::SyncResult;
use crate::core::http::fetch_bytes;
use crate::core::pack::Manifest;
use crate::core::progress::Progress;
use crate::core::version::{RuntimeCatalog, VersionManifest};

pub use assets::AssetsBuilder;
pub use client_jar::ClientJarBuilder;
pub use fabric::FabricGenerator;
pub use libraries::{LibrariesBuilder, LibrariesOutput};
pub use natives::{NativesBuilder, NATIVE_EXTENSIONS};
pub use runtime::RuntimeBuilder;
pub use vanilla::VanillaGenerator;

/// Version list and managed-runtime catalog, loaded once and shared by every
/// generator run.
#[derive(Debug, Clone)]
pub struct UpstreamMetadata {
    pub versions: VersionManifest,
    pub runtimes: RuntimeCatalog,
}

impl UpstreamMetadata {
    pub async fn fetch(client: &reqwest::Client, endpoints: &Endpoints) -> SyncResult<Self> {
        let (versions, runtimes) = futures_util::future::try_join(
            VersionManifest::fetch(client, &endpoints.version_manifest_url),
            RuntimeCatalog::fetch(client, &endpoints.runtime_manifest_url),
        )
        .await?;

        info!(
            "Loaded {} versions and runtimes for {} platforms",
            versions.versions.len(),
            runtimes.platforms.len()
        );
        Ok(Self { versions, runtimes })
    }
}

/// Everything a builder needs besides its own inputs.
pub struct GenerateContext<'a> {
    /// Destination the pack is written to.
    pub connector: &'a AnyConnector,
    pub client: &'a reqwest::Client,
    pub upstream: &'a UpstreamMetadata,
    pub endpoints: &'a Endpoints,
    pub progress: &'a Progress,
}

/// One stage of the pipeline.
#[async_trait]
pub trait PackBuilder: Send + Sync {
    type Output: Send;

    /// Destination paths that are missing or hold the wrong bytes. Nothing
    /// is written.
    async fn filter_elements(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>>;

    /// Store whatever [`filter_elements`](Self::filter_elements) reports and
    /// describe every file of the stage.
    async fn download(&self, ctx: &GenerateContext<'_>) -> SyncResult<Self::Output>;
}

/// Fetch an upstream payload, rejecting it when a known SHA-1 disagrees.
pub(crate) async fn fetch_verified(
    client: &reqwest::Client,
    url: &str,
    sha1: &str,
) -> SyncResult<Vec<u8>> {
    let bytes = fetch_bytes(client, url).await?;
    if !sha1.is_empty() {
        verify_sha1(url, &bytes, sha1)?;
    }
    Ok(bytes)
}

/// Generator dispatch without `Box<dyn>`.
pub enum PackGenerator {
    Vanilla(VanillaGenerator),
    Fabric(FabricGenerator),
}

impl PackGenerator {
    /// Pack version the manifest will carry.
    pub fn pack_version(&self) -> &str {
        match self {
            PackGenerator::Vanilla(g) => g.pack_version(),
            PackGenerator::Fabric(g) => g.pack_version(),
        }
    }

    pub async fn generate(&self, ctx: &GenerateContext<'_>) -> SyncResult<Manifest> {
        match self {
            PackGenerator::Vanilla(g) => g.generate(ctx).await,
            PackGenerator::Fabric(g) => g.generate(ctx).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn upstream_metadata_loads_both_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/versions.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latest": {"release": "1.20.4", "snapshot": "24w01a"},
                "versions": [
                    {"id": "24w01a", "type": "snapshot", "url": "https://x/24w01a.json"},
                    {"id": "1.20.4", "type": "release", "url": "https://x/1.20.4.json"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/runtimes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "linux": {"java-runtime-gamma": [
                    {"manifest": {"sha1": "aa", "size": 1, "url": "https://x/gamma.json"}}
                ]}
            })))
            .mount(&server)
            .await;

        let endpoints = Endpoints {
            version_manifest_url: format!("{}/versions.json", server.uri()),
            runtime_manifest_url: format!("{}/runtimes.json", server.uri()),
            ..Endpoints::default()
        };
        let upstream = UpstreamMetadata::fetch(&reqwest::Client::new(), &endpoints)
            .await
            .unwrap();

        assert_eq!(upstream.versions.releases().len(), 1);
        assert!(upstream
            .runtimes
            .find(crate::core::rules::Platform::Linux, "java-runtime-gamma")
            .is_ok());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_an_error() {
        let server = MockServer::start().await;
        let endpoints = Endpoints {
            version_manifest_url: format!("{}/missing.json", server.uri()),
            runtime_manifest_url: format!("{}/missing.json", server.uri()),
            ..Endpoints::default()
        };

        let err = UpstreamMetadata::fetch(&reqwest::Client::new(), &endpoints)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::core::error::SyncError::DownloadFailed { status: 404, .. }));
    }
}
