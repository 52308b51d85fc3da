// ─── Game Folder ───
// A local tree bound to the manifest served by one connector.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::keep::KeepSet;
use super::model::{Argument, Manifest, ManifestArguments, CLIENT_JAR, LIBRARIES_DIR, MANIFEST_FILE};
use crate::core::config::SyncSettings;
use crate::core::connectors::AnyConnector;
use crate::core::error::{SyncError, SyncResult};
use crate::core::rules::{should_include, should_include_features, Environment, Feature, Platform};

#[derive(Debug)]
pub struct GameFolder {
    root: PathBuf,
    manifest: Manifest,
    connector: AnyConnector,
    keep: KeepSet,
    max_workers: Option<usize>,
}

impl GameFolder {
    /// Connect, fetch `manifest.json` and bind it to `root`.
    pub async fn open(connector: AnyConnector, root: impl Into<PathBuf>) -> SyncResult<Self> {
        let root = root.into();
        info!("Opening game folder {:?} from {}", root, connector.uri());

        connector.connect().await?;

        let manifest = match connector.read_file_bytes(MANIFEST_FILE, None).await {
            Ok(bytes) => Manifest::from_slice(&bytes),
            Err(e) => Err(e),
        }
        .map_err(|e| SyncError::ManifestUnavailable {
            location: format!("{}/{}", connector.uri().trim_end_matches('/'), MANIFEST_FILE),
            source: Box::new(e),
        })?;

        debug!(
            "Manifest {} ({}) lists {} files",
            manifest.version,
            manifest.game_version,
            manifest.files.len()
        );
        Ok(Self::from_manifest(connector, root, manifest))
    }

    pub fn from_manifest(
        connector: AnyConnector,
        root: impl Into<PathBuf>,
        manifest: Manifest,
    ) -> Self {
        Self {
            root: root.into(),
            manifest,
            connector,
            keep: KeepSet::with_defaults(),
            max_workers: None,
        }
    }

    /// Cap the number of concurrent fetches during a build.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers.max(1));
        self
    }

    /// Apply persisted keep patterns and the worker cap.
    pub fn with_settings(mut self, settings: &SyncSettings) -> SyncResult<Self> {
        self.keep = settings.keep_set()?;
        self.max_workers = settings.max_workers.map(|w| w.max(1));
        Ok(self)
    }

    pub fn with_keep_set(mut self, keep: KeepSet) -> Self {
        self.keep = keep;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn connector(&self) -> &AnyConnector {
        &self.connector
    }

    pub fn keep_set(&self) -> &KeepSet {
        &self.keep
    }

    pub(crate) fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn game_version(&self) -> &str {
        &self.manifest.game_version
    }

    pub fn main_class(&self) -> &str {
        &self.manifest.main_class
    }

    pub fn asset_index(&self) -> &str {
        &self.manifest.asset_index
    }

    pub fn arguments(&self) -> &ManifestArguments {
        &self.manifest.arguments
    }

    /// Absolute path of the runtime executable for the host platform.
    pub fn runtime_binary(&self) -> SyncResult<PathBuf> {
        self.runtime_binary_for(Environment::current().platform)
    }

    pub fn runtime_binary_for(&self, platform: Platform) -> SyncResult<PathBuf> {
        self.manifest
            .runtime_binaries
            .get(&platform)
            .map(|relative| self.root.join(relative))
            .ok_or_else(|| SyncError::RuntimeNotFound {
                component: format!("pack {}", self.manifest.version),
                platform: platform.to_string(),
            })
    }

    /// `minecraft.jar` followed by every file under `libraries/`, joined with
    /// the platform's classpath separator.
    pub async fn classpath(&self) -> SyncResult<String> {
        let separator = if cfg!(windows) { ";" } else { ":" };

        let mut entries = vec![self.root.join(CLIENT_JAR)];
        let libraries = self.root.join(LIBRARIES_DIR);
        if tokio::fs::try_exists(&libraries).await.unwrap_or(false) {
            entries.extend(walk_files(&libraries).await?);
        }

        Ok(entries
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(separator))
    }

    /// Protect an existing file from reconciliation.
    pub async fn keep(&mut self, file: &str) -> SyncResult<()> {
        let relative = file.trim_start_matches('/');
        let path = self.root.join(relative);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SyncError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file to keep does not exist"),
            ));
        }
        self.keep.keep_exact(relative);
        Ok(())
    }

    /// Protect every relative path matching a glob.
    pub fn keep_pattern(&mut self, pattern: &str) -> SyncResult<()> {
        self.keep.keep_glob(pattern)
    }

    /// Protect every relative path containing a regex match.
    pub fn keep_regex(&mut self, pattern: &str) -> SyncResult<()> {
        self.keep.keep_regex(pattern)
    }
}

/// Flatten argument templates for `env`. Conditional values are kept when
/// their rules admit the environment or, for feature-gated rules, when one of
/// the active features opts in.
pub fn resolve_arguments(
    args: &[Argument],
    env: &Environment,
    features: &[Feature],
) -> Vec<String> {
    args.iter()
        .flat_map(|arg| match arg {
            Argument::Literal(value) => vec![value.clone()],
            Argument::Conditional { rules, value } => {
                if should_include(rules, env) || should_include_features(rules, features) {
                    value.values()
                } else {
                    Vec::new()
                }
            }
        })
        .collect()
}

/// Every regular file below `root`, sorted. Symlinks are not followed.
pub(crate) async fn walk_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| SyncError::io(&dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io(&dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| SyncError::io(entry.path(), e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `root`-relative, `/`-separated form of `path`.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
