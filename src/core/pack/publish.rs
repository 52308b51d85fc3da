// ─── Publish ───
// Push a local pack directory to a connector. Files the manifest does not
// know yet are appended as `extra` entries; the manifest goes up last.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use super::folder::{relative_key, walk_files};
use super::model::{FileCategory, FileEntry, Manifest, MANIFEST_FILE};
use crate::core::checksum::sha1_hex;
use crate::core::connectors::AnyConnector;
use crate::core::error::{SyncError, SyncResult};
use crate::core::progress::Progress;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Files uploaded, manifest excluded.
    pub uploaded: usize,
    /// Entries appended to the manifest as `extra`.
    pub added: usize,
}

pub async fn publish(
    connector: &AnyConnector,
    pack_dir: &Path,
    progress: &Progress,
) -> SyncResult<PublishReport> {
    info!("Publishing {:?} to {}", pack_dir, connector.uri());
    connector.connect().await?;

    let manifest_path = pack_dir.join(MANIFEST_FILE);
    let raw = tokio::fs::read(&manifest_path)
        .await
        .map_err(|e| SyncError::io(&manifest_path, e))?;
    let mut manifest = Manifest::from_slice(&raw).map_err(|e| SyncError::ManifestUnavailable {
        location: manifest_path.display().to_string(),
        source: Box::new(e),
    })?;

    let files: Vec<_> = walk_files(pack_dir)
        .await?
        .into_iter()
        .filter_map(|path| relative_key(pack_dir, &path).map(|relative| (path, relative)))
        .filter(|(_, relative)| relative != MANIFEST_FILE)
        .collect();
    let total = files.len();
    info!("Found {} files to publish", total);

    // relative path -> mode, first entry wins
    let mut known: HashMap<String, u32> = HashMap::with_capacity(manifest.files.len());
    for entry in &manifest.files {
        known.entry(entry.path.clone()).or_insert_with(|| entry.mode());
    }
    let mut report = PublishReport::default();

    for (index, (path, relative)) in files.iter().enumerate() {
        progress.report("Publishing", index, total, relative);

        let bytes = tokio::fs::read(path).await.map_err(|e| SyncError::io(path, e))?;
        let mode = known.get(relative).copied();
        connector.send_file_from_bytes(relative, &bytes, mode).await?;
        report.uploaded += 1;

        if mode.is_none() {
            debug!("Adding {} to the manifest as extra", relative);
            let entry = FileEntry::new(
                relative.as_str(),
                bytes.len() as u64,
                sha1_hex(&bytes),
                FileCategory::Extra,
            );
            known.insert(relative.clone(), entry.mode());
            manifest.files.push(entry);
            report.added += 1;
        }
    }
    progress.report("Publishing", total, total, "Complete!");

    connector
        .send_file_from_bytes(MANIFEST_FILE, &manifest.to_json_bytes()?, None)
        .await?;
    info!(
        "Published {} files ({} new) and the manifest to {}",
        report.uploaded,
        report.added,
        connector.uri()
    );
    Ok(report)
}
