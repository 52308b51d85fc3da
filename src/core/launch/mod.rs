// ─── Launch ───
// Everything a launcher needs from a built game folder. Placeholder
// substitution and process management belong to the `ProcessLauncher`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::core::auth::AuthSession;
use crate::core::error::SyncResult;
use crate::core::pack::{resolve_arguments, GameFolder, NATIVES_DIR};
use crate::core::rules::{Environment, Feature};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub game_dir: PathBuf,
    /// Bundled runtime for the environment's platform, if the pack ships one.
    pub runtime: Option<PathBuf>,
    pub natives_dir: PathBuf,
    pub classpath: String,
    pub main_class: String,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub asset_index: String,
    pub version: String,
}

impl LaunchSpec {
    pub async fn from_folder(
        folder: &GameFolder,
        env: &Environment,
        features: &[Feature],
    ) -> SyncResult<Self> {
        let arguments = folder.arguments();
        let spec = Self {
            game_dir: folder.root().to_path_buf(),
            runtime: folder.runtime_binary_for(env.platform).ok(),
            natives_dir: folder.root().join(NATIVES_DIR).join(env.platform.as_str()),
            classpath: folder.classpath().await?,
            main_class: folder.main_class().to_string(),
            jvm_args: resolve_arguments(&arguments.jvm, env, features),
            game_args: resolve_arguments(&arguments.game, env, features),
            asset_index: folder.asset_index().to_string(),
            version: folder.game_version().to_string(),
        };
        debug!(
            "Launch spec for {} on {}: {} jvm args, {} game args",
            spec.version,
            env.platform,
            spec.jvm_args.len(),
            spec.game_args.len()
        );
        Ok(spec)
    }
}

/// Starts the game and reports its exit code.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, spec: LaunchSpec, session: &AuthSession) -> SyncResult<i32>;
}
