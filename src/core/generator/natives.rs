use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{fetch_verified, GenerateContext, PackBuilder};
use crate::core::checksum::{sha1_hex, ChecksumKind};
use crate::core::error::SyncResult;
use crate::core::pack::{join_path, FileCategory, FileEntry, NATIVES_DIR};
use crate::core::rules::NativeClassifier;

/// File extensions extracted from native archives.
pub const NATIVE_EXTENSIONS: [&str; 3] = ["so", "dll", "dylib"];

/// Shared libraries pulled out of native jars into `natives/<platform>/`.
pub struct NativesBuilder {
    natives: Vec<NativeClassifier>,
}

impl NativesBuilder {
    pub fn new(natives: Vec<NativeClassifier>) -> Self {
        Self { natives }
    }
}

/// `(file name, contents)` of every native library in a jar, directory
/// prefixes dropped.
pub(crate) fn extract_native_libraries(
    archive_bytes: Vec<u8>,
) -> SyncResult<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut found = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let Some(file_name) = name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        let is_native = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| NATIVE_EXTENSIONS.contains(&ext));
        if !is_native {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        found.push((file_name.to_string(), bytes));
    }

    Ok(found)
}

#[async_trait]
impl PackBuilder for NativesBuilder {
    type Output = Vec<FileEntry>;

    /// Native payloads are only known after their archives are opened, so
    /// this reports the archives rather than the extracted files.
    async fn filter_elements(&self, _ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>> {
        Ok(self.natives.iter().map(|n| n.artifact.path.clone()).collect())
    }

    async fn download(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<FileEntry>> {
        let total = self.natives.len();
        info!("Extracting {} native archives", total);

        let mut entries: Vec<FileEntry> = Vec::new();
        let mut stored: HashMap<String, String> = HashMap::new();

        for (index, native) in self.natives.iter().enumerate() {
            let archive =
                fetch_verified(ctx.client, &native.artifact.url, &native.artifact.sha1).await?;
            let libraries =
                tokio::task::spawn_blocking(move || extract_native_libraries(archive)).await??;

            for (file_name, bytes) in libraries {
                let path = join_path(&[NATIVES_DIR, native.platform.as_str(), &file_name]);
                let sha = sha1_hex(&bytes);

                match stored.get(&path) {
                    Some(existing) if *existing == sha => continue,
                    Some(_) => {
                        warn!(
                            "{} is shipped twice with different contents, keeping the first",
                            path
                        );
                        continue;
                    }
                    None => {}
                }

                if ctx
                    .connector
                    .has_file_with_checksum(&path, ChecksumKind::Sha1, &sha)
                    .await
                {
                    debug!("{} already stored", path);
                } else {
                    ctx.connector.send_file_from_bytes(&path, &bytes, None).await?;
                }

                stored.insert(path.clone(), sha.clone());
                entries.push(
                    FileEntry::new(path, bytes.len() as u64, sha, FileCategory::Natives)
                        .with_rules(Some(native.rules.clone())),
                );
            }

            ctx.progress
                .report("Downloading natives", index + 1, total, &native.artifact.path);
        }

        Ok(entries)
    }
}
