// ─── Build ───
// scan → fetch → reconcile. Brings the local tree in line with the manifest
// and prunes whatever the manifest and the KeepSet do not account for.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::folder::{relative_key, walk_files, GameFolder};
use super::model::{validate_relative_path, FileEntry};
use crate::core::checksum::{file_sha1, ChecksumKind};
use crate::core::connectors::write_atomic;
use crate::core::error::{SyncError, SyncResult};
use crate::core::progress::Progress;
use crate::core::rules::{should_include, Environment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Entries downloaded in this pass.
    pub fetched: usize,
    /// Entries already present with the right hash.
    pub satisfied: usize,
    /// Entries whose rules exclude the environment.
    pub skipped: usize,
    /// Local files deleted during reconciliation.
    pub removed: usize,
}

struct ScanResult<'a> {
    queue: Vec<(&'a FileEntry, PathBuf)>,
    allowed: HashSet<PathBuf>,
    satisfied: usize,
    skipped: usize,
}

impl GameFolder {
    /// Synchronize the folder for the host environment.
    pub async fn build(&self, progress: &Progress) -> SyncResult<BuildReport> {
        self.build_with_env(Environment::current(), progress).await
    }

    pub async fn build_with_env(
        &self,
        env: &Environment,
        progress: &Progress,
    ) -> SyncResult<BuildReport> {
        info!(
            "Building {:?} from {} (version {}, {}/{})",
            self.root(),
            self.connector().uri(),
            self.version(),
            env.platform,
            env.arch
        );

        let scan = self.scan(env).await?;
        info!(
            "Scan: {} to fetch, {} up to date, {} not for this platform",
            scan.queue.len(),
            scan.satisfied,
            scan.skipped
        );

        let fetched = scan.queue.len();
        self.fetch(scan.queue, progress).await?;
        let removed = self.reconcile(&scan.allowed).await?;

        let report = BuildReport {
            fetched,
            satisfied: scan.satisfied,
            skipped: scan.skipped,
            removed,
        };
        info!("Build finished: {:?}", report);
        Ok(report)
    }

    // ── Scan ──

    async fn scan(&self, env: &Environment) -> SyncResult<ScanResult<'_>> {
        let mut result = ScanResult {
            queue: Vec::new(),
            allowed: HashSet::new(),
            satisfied: 0,
            skipped: 0,
        };

        for entry in &self.manifest().files {
            if !should_include(entry.rules(), env) {
                debug!("Skipping {} (rules exclude {})", entry.path, env.platform);
                result.skipped += 1;
                continue;
            }

            validate_relative_path(&entry.path)?;
            let dest = self.root().join(&entry.path);
            result.allowed.insert(dest.clone());

            match file_sha1(&dest).await {
                Some(actual) if actual.eq_ignore_ascii_case(&entry.sha) => result.satisfied += 1,
                Some(_) => {
                    warn!("{} does not match its manifest hash, fetching again", entry.path);
                    result.queue.push((entry, dest));
                }
                None => result.queue.push((entry, dest)),
            }
        }

        Ok(result)
    }

    // ── Fetch ──

    async fn fetch(
        &self,
        queue: Vec<(&FileEntry, PathBuf)>,
        progress: &Progress,
    ) -> SyncResult<()> {
        if queue.is_empty() {
            return Ok(());
        }

        let total = queue.len();
        let parallelism = std::thread::available_parallelism().map_or(1, |n| n.get());
        let mut workers = parallelism.min(total);
        if let Some(max) = self.max_workers() {
            workers = workers.min(max);
        }

        self.connector().set_pool_size(workers).await?;
        info!("Fetching {} files with {} workers", total, workers);

        let first_error: Mutex<Option<SyncError>> = Mutex::new(None);
        let done = AtomicUsize::new(0);

        stream::iter(queue)
            .for_each_concurrent(workers, |(entry, dest)| {
                let first_error = &first_error;
                let done = &done;
                async move {
                    if let Err(e) = self.fetch_entry(entry, &dest).await {
                        warn!("Failed to fetch {}: {}", entry.path, e);
                        if let Ok(mut slot) = first_error.lock() {
                            slot.get_or_insert(e);
                        }
                    }
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.report("Downloading files", current, total, &entry.path);
                }
            })
            .await;

        let first_error = first_error.into_inner().unwrap_or_else(PoisonError::into_inner);
        first_error.map_or(Ok(()), Err)
    }

    async fn fetch_entry(&self, entry: &FileEntry, dest: &Path) -> SyncResult<()> {
        let bytes = self
            .connector()
            .read_file_bytes(&entry.path, Some(entry.size))
            .await?;

        if !ChecksumKind::Sha1.matches(&bytes, &entry.sha) {
            warn!("{} fetched with an unexpected hash; the next build retries it", entry.path);
        }

        write_atomic(dest, &bytes, Some(entry.mode())).await?;
        debug!("Fetched {} ({} bytes)", entry.path, bytes.len());
        Ok(())
    }

    // ── Reconcile ──

    async fn reconcile(&self, allowed: &HashSet<PathBuf>) -> SyncResult<usize> {
        if !tokio::fs::try_exists(self.root()).await.unwrap_or(false) {
            return Ok(0);
        }

        let mut stale = Vec::new();
        for path in walk_files(self.root()).await? {
            if allowed.contains(&path) {
                continue;
            }

            let relative = relative_key(self.root(), &path).unwrap_or_default();
            if let Some(matched) = self.keep_set().find_match(&relative, &path) {
                debug!("Keeping {} ({:?})", relative, matched);
                continue;
            }
            stale.push((relative, path));
        }

        remove_stale(stale).await
    }
}

/// Delete every stale file. A failed removal does not stop the pass; the
/// first failure is returned once every candidate has been tried.
async fn remove_stale(stale: Vec<(String, PathBuf)>) -> SyncResult<usize> {
    let mut removed = 0;
    let mut first_error = None;

    for (relative, path) in stale {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed stale file {}", relative);
                removed += 1;
            }
            Err(e) => {
                warn!("Could not remove stale file {}: {}", relative, e);
                first_error.get_or_insert(SyncError::io(&path, e));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(removed),
    }
}
