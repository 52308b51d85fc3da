use std::path::Path;

use tracing::info;

use super::{GenerateContext, UpstreamMetadata, VanillaGenerator};
use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::{Argument, Manifest};
use crate::core::version::FabricProfile;

/// A vanilla pack with a Fabric loader profile layered on top: extra
/// libraries, the loader's main class and its arguments.
#[derive(Debug, Clone)]
pub struct FabricGenerator {
    profile: FabricProfile,
    vanilla: VanillaGenerator,
}

impl FabricGenerator {
    /// Read a loader profile from disk and resolve the version it inherits.
    pub async fn resolve(
        client: &reqwest::Client,
        upstream: &UpstreamMetadata,
        profile_path: &Path,
    ) -> SyncResult<Self> {
        let raw = tokio::fs::read(profile_path)
            .await
            .map_err(|e| SyncError::io(profile_path, e))?;
        let profile = FabricProfile::from_slice(&raw)?;
        info!("Fabric profile {} inherits {}", profile.id, profile.inherits_from);

        let vanilla = VanillaGenerator::resolve(client, upstream, &profile.inherits_from).await?;
        Self::from_parts(profile, vanilla)
    }

    pub fn from_parts(profile: FabricProfile, mut vanilla: VanillaGenerator) -> SyncResult<Self> {
        let loader_libraries = profile
            .libraries
            .iter()
            .map(|lib| lib.to_library())
            .collect::<SyncResult<Vec<_>>>()?;

        let mut arguments = vanilla.version.argument_templates();
        arguments
            .game
            .extend(profile.arguments.game.iter().map(|a| Argument::from(a.as_str())));
        arguments
            .jvm
            .extend(profile.arguments.jvm.iter().map(|a| Argument::from(a.as_str())));

        vanilla.pack_version = profile.id.clone();
        vanilla.version.main_class = profile.main_class.clone();
        vanilla.version.libraries.extend(loader_libraries);
        vanilla.version.arguments = Some(arguments);

        Ok(Self { profile, vanilla })
    }

    pub fn pack_version(&self) -> &str {
        self.vanilla.pack_version()
    }

    pub fn profile(&self) -> &FabricProfile {
        &self.profile
    }

    pub async fn generate(&self, ctx: &GenerateContext<'_>) -> SyncResult<Manifest> {
        info!("Generating Fabric pack {}", self.profile.id);
        self.vanilla.generate(ctx).await
    }
}
