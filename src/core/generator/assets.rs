use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{fetch_verified, GenerateContext, PackBuilder};
use crate::core::assets::FetchedAssetIndex;
use crate::core::checksum::{sha1_hex, ChecksumKind};
use crate::core::error::SyncResult;
use crate::core::pack::{FileCategory, FileEntry};

/// The asset index plus every object it references, stored content-addressed
/// under `assets/objects`.
pub struct AssetsBuilder {
    index: FetchedAssetIndex,
}

impl AssetsBuilder {
    pub fn new(index: FetchedAssetIndex) -> Self {
        Self { index }
    }

    fn index_entry(&self) -> FileEntry {
        FileEntry::new(
            self.index.index_path(),
            self.index.raw.len() as u64,
            sha1_hex(&self.index.raw),
            FileCategory::Assets,
        )
    }
}

#[async_trait]
impl PackBuilder for AssetsBuilder {
    type Output = Vec<FileEntry>;

    async fn filter_elements(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>> {
        let mut pending = Vec::new();

        let index = self.index_entry();
        if !ctx
            .connector
            .has_file_with_checksum(&index.path, ChecksumKind::Sha1, &index.sha)
            .await
        {
            pending.push(index.path);
        }

        for object in self.index.index.unique_objects() {
            let path = object.object_path();
            if !ctx
                .connector
                .has_file_with_checksum(&path, ChecksumKind::Sha1, &object.hash)
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
        info!("Asset index {}: {} files to download", self.index.id, total);

        let index = self.index_entry();
        let mut done = 0;
        if pending.contains(&index.path) {
            ctx.connector
                .send_file_from_bytes(&index.path, &self.index.raw, None)
                .await?;
            done += 1;
            ctx.progress.report("Downloading assets", done, total, &index.path);
        }

        let mut entries = vec![index];
        for object in self.index.index.unique_objects() {
            let path = object.object_path();
            if pending.contains(&path) {
                let url = object.url(&ctx.endpoints.resources_base_url);
                let bytes = fetch_verified(ctx.client, &url, &object.hash).await?;
                ctx.connector.send_file_from_bytes(&path, &bytes, None).await?;
                done += 1;
                ctx.progress.report("Downloading assets", done, total, &object.hash);
            } else {
                debug!("Asset {} already stored", object.hash);
            }

            entries.push(FileEntry::new(
                path,
                object.size,
                object.hash.as_str(),
                FileCategory::Assets,
            ));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generator::testing::Fixture;

    fn index(objects: &[(&str, &[u8])]) -> FetchedAssetIndex {
        let mut map = serde_json::Map::new();
        for (name, bytes) in objects {
            map.insert(
                name.to_string(),
                serde_json::json!({"hash": sha1_hex(bytes), "size": bytes.len()}),
            );
        }
        let raw = serde_json::to_vec(&serde_json::json!({"objects": map})).unwrap();
        FetchedAssetIndex::from_parts("12", raw).unwrap()
    }

    fn object_route(bytes: &[u8]) -> String {
        let hash = sha1_hex(bytes);
        format!("/objects/{}/{}", &hash[..2], hash)
    }

    #[tokio::test]
    async fn stores_index_and_shared_objects_once() {
        let fixture = Fixture::new().await;
        fixture.serve(&object_route(b"sound"), b"sound".to_vec(), 1).await;
        fixture.serve(&object_route(b"icon"), b"icon".to_vec(), 1).await;

        let index = index(&[("a.ogg", b"sound"), ("b.ogg", b"sound"), ("icon.png", b"icon")]);
        let raw = index.raw.clone();
        let entries = AssetsBuilder::new(index).download(&fixture.ctx()).await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, "assets/indexes/12.json");
        assert_eq!(fixture.read("assets/indexes/12.json"), raw);

        let hash = sha1_hex(b"sound");
        let object_path = format!("assets/objects/{}/{}", &hash[..2], hash);
        assert!(entries.iter().any(|e| e.path == object_path && e.sha == hash));
        assert_eq!(fixture.read(&object_path), b"sound");
    }

    #[tokio::test]
    async fn present_objects_are_skipped() {
        let fixture = Fixture::new().await;
        fixture.serve(&object_route(b"icon"), b"icon".to_vec(), 0).await;

        let hash = sha1_hex(b"icon");
        fixture.store(&format!("assets/objects/{}/{}", &hash[..2], hash), b"icon");
        let builder = AssetsBuilder::new(index(&[("icon.png", b"icon")]));

        assert_eq!(
            builder.filter_elements(&fixture.ctx()).await.unwrap(),
            vec!["assets/indexes/12.json".to_string()]
        );
        assert_eq!(builder.download(&fixture.ctx()).await.unwrap().len(), 2);
    }
}
