use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::{read_capacity, Connector};
use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::validate_relative_path;

const SCHEME: &str = "file";

/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileConnector {
    root: PathBuf,
    root_display: String,
}

impl FileConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_display = root.to_string_lossy().into_owned();
        Self { root, root_display }
    }

    /// `file:///abs/path`, or `file://./rel/path` resolved against the
    /// working directory.
    pub fn from_uri(uri: &str) -> SyncResult<Self> {
        let raw = uri
            .strip_prefix("file://")
            .ok_or_else(|| SyncError::InvalidUri {
                uri: uri.to_string(),
                reason: "expected file:// scheme".into(),
            })?;
        if raw.is_empty() {
            return Err(SyncError::InvalidUri {
                uri: uri.to_string(),
                reason: "empty path".into(),
            });
        }

        let path = Path::new(raw);
        if path.is_absolute() {
            return Ok(Self::new(path));
        }

        let cwd = std::env::current_dir().map_err(|e| SyncError::io(".", e))?;
        let relative = raw.strip_prefix("./").unwrap_or(raw);
        Ok(Self::new(cwd.join(relative)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> SyncResult<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        validate_relative_path(trimmed)?;
        Ok(self.root.join(trimmed))
    }
}

#[async_trait]
impl Connector for FileConnector {
    fn scheme(&self) -> &'static str {
        SCHEME
    }

    fn uri(&self) -> String {
        format!("{SCHEME}://{}", self.root_display)
    }

    fn path(&self) -> &str {
        &self.root_display
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> SyncResult<()> {
        Ok(())
    }

    async fn close(&self) -> SyncResult<()> {
        Ok(())
    }

    async fn read_file_bytes(&self, path: &str, expected_size: Option<u64>) -> SyncResult<Vec<u8>> {
        use tokio::io::AsyncReadExt;

        let full = self.resolve(path)?;
        let mut file = tokio::fs::File::open(&full)
            .await
            .map_err(|e| SyncError::io(&full, e))?;

        let on_disk = file.metadata().await.map(|m| m.len()).unwrap_or_default();
        let mut buf = Vec::with_capacity(read_capacity(expected_size, on_disk));
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| SyncError::io(&full, e))?;
        Ok(buf)
    }

    async fn send_file_from_bytes(
        &self,
        path: &str,
        bytes: &[u8],
        mode: Option<u32>,
    ) -> SyncResult<()> {
        let full = self.resolve(path)?;
        write_atomic(&full, bytes, mode).await?;
        debug!("Stored {} bytes at {:?}", bytes.len(), full);
        Ok(())
    }

    async fn has_file(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => tokio::fs::metadata(full).await.is_ok_and(|m| m.is_file()),
            Err(_) => false,
        }
    }
}

/// Write `bytes` to a hidden temporary sibling, flush and sync it, then rename
/// it over `dest`. Readers see either the previous file or the new one.
pub(crate) async fn write_atomic(dest: &Path, bytes: &[u8], mode: Option<u32>) -> SyncResult<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| SyncError::UnsafePath(dest.to_string_lossy().into_owned()))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| SyncError::io(parent, e))?;

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{name}.{}.part", Uuid::new_v4()));

    let written = async {
        // handle must be closed before the rename on Windows
        {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&tmp, dest).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SyncError::io(dest, e));
    }

    apply_mode(dest, mode.unwrap_or(0o644)).await
}

#[cfg(unix)]
async fn apply_mode(path: &Path, mode: u32) -> SyncResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| SyncError::io(path, e))
}

#[cfg(not(unix))]
async fn apply_mode(_path: &Path, _mode: u32) -> SyncResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::{sha1_hex, sha256_hex, ChecksumKind};

    #[tokio::test]
    async fn send_then_read_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());

        connector
            .send_file_from_bytes("libraries/org/a.jar", b"0123456789", None)
            .await
            .unwrap();

        assert!(connector.has_file("libraries/org/a.jar").await);
        let bytes = connector.read_file_bytes("libraries/org/a.jar", Some(10)).await.unwrap();
        assert_eq!(bytes, b"0123456789");
    }

    #[tokio::test]
    async fn bogus_expected_size_is_capped_at_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());
        connector.send_file_from_bytes("a.jar", b"0123456789", None).await.unwrap();

        let bytes = connector.read_file_bytes("a.jar", Some(u64::MAX)).await.unwrap();
        assert_eq!(bytes, b"0123456789");
        let bytes = connector.read_file_bytes("a.jar", Some(3)).await.unwrap();
        assert_eq!(bytes, b"0123456789");
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_reader_sees_whole_files_only() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        const SIZE: usize = 4 * 1024 * 1024;
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());
        let old = vec![b'a'; SIZE];
        let new = vec![b'b'; SIZE];
        connector.send_file_from_bytes("assets/blob", &old, None).await.unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let target = dir.path().join("assets/blob");
        let reader = tokio::spawn({
            let done = done.clone();
            async move {
                let mut reads = 0usize;
                loop {
                    let bytes = tokio::fs::read(&target).await.unwrap();
                    assert_eq!(bytes.len(), SIZE);
                    let first = bytes[0];
                    assert!(first == b'a' || first == b'b');
                    assert!(bytes.iter().all(|&b| b == first));
                    reads += 1;
                    if done.load(Ordering::Relaxed) {
                        return reads;
                    }
                }
            }
        });

        for round in 0..20 {
            let bytes = if round % 2 == 0 { &new } else { &old };
            connector.send_file_from_bytes("assets/blob", bytes, None).await.unwrap();
        }
        done.store(true, Ordering::Relaxed);

        assert!(reader.await.unwrap() > 0);
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());

        connector.send_file_from_bytes("a.txt", b"old", None).await.unwrap();
        connector.send_file_from_bytes("a.txt", b"new content", None).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt".to_string()]);
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"new content");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn mode_is_applied_after_promotion() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());
        connector
            .send_file_from_bytes("runtime/linux/bin/java", b"#!", Some(0o755))
            .await
            .unwrap();

        let mode = std::fs::metadata(dir.path().join("runtime/linux/bin/java"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn checksum_lookup_supports_both_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path());
        connector.send_file_from_bytes("blob", b"abc", None).await.unwrap();

        let sha1 = sha1_hex(b"abc");
        assert!(connector.has_file_with_checksum("blob", ChecksumKind::Sha1, &sha1).await);
        let sha256 = sha256_hex(b"abc");
        assert!(connector.has_file_with_checksum("blob", ChecksumKind::Sha256, &sha256).await);
        let other = sha1_hex(b"abd");
        assert!(!connector.has_file_with_checksum("blob", ChecksumKind::Sha1, &other).await);
        assert!(!connector.has_file_with_checksum("missing", ChecksumKind::Sha1, &sha1).await);
    }

    #[tokio::test]
    async fn escaping_paths_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileConnector::new(dir.path().join("pack"));

        let err = connector.send_file_from_bytes("../escape.txt", b"x", None).await.unwrap_err();
        assert!(matches!(err, SyncError::UnsafePath(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn relative_uri_resolves_against_working_directory() {
        let connector = FileConnector::from_uri("file://./packs/demo").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(connector.root(), cwd.join("packs/demo"));

        let absolute = FileConnector::from_uri("file:///srv/packs/demo").unwrap();
        assert_eq!(absolute.root(), Path::new("/srv/packs/demo"));
        assert_eq!(absolute.uri(), "file:///srv/packs/demo");
        assert!(FileConnector::from_uri("file://").is_err());
    }
}
