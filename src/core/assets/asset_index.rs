use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::debug;

use crate::core::checksum::verify_sha1;
use crate::core::error::SyncResult;
use crate::core::http::fetch_bytes;
use crate::core::pack::{join_path, ASSETS_DIR};
use crate::core::version::AssetIndexInfo;

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// `assets/objects/<first two hex chars>/<hash>`
    pub fn object_path(&self) -> String {
        join_path(&[ASSETS_DIR, "objects", self.shard(), &self.hash])
    }

    /// `<base>/<first two hex chars>/<hash>`
    pub fn url(&self, resources_base: &str) -> String {
        format!("{}/{}/{}", resources_base.trim_end_matches('/'), self.shard(), self.hash)
    }

    fn shard(&self) -> &str {
        self.hash.get(..2).unwrap_or(&self.hash)
    }
}

/// An asset index together with the exact bytes it was served as.
#[derive(Debug, Clone)]
pub struct FetchedAssetIndex {
    pub id: String,
    pub index: AssetIndex,
    pub raw: Vec<u8>,
}

impl FetchedAssetIndex {
    pub async fn fetch(client: &reqwest::Client, info: &AssetIndexInfo) -> SyncResult<Self> {
        let raw = fetch_bytes(client, &info.url).await?;
        if let Some(expected) = &info.sha1 {
            verify_sha1(&info.url, &raw, expected)?;
        }
        let index: AssetIndex = serde_json::from_slice(&raw)?;
        debug!("Asset index {} lists {} objects", info.id, index.objects.len());

        Ok(Self {
            id: info.id.clone(),
            index,
            raw,
        })
    }

    pub fn from_parts(id: impl Into<String>, raw: Vec<u8>) -> SyncResult<Self> {
        let index = serde_json::from_slice(&raw)?;
        Ok(Self {
            id: id.into(),
            index,
            raw,
        })
    }

    /// `assets/indexes/<id>.json`
    pub fn index_path(&self) -> String {
        join_path(&[ASSETS_DIR, "indexes", &format!("{}.json", self.id)])
    }
}

impl AssetIndex {
    /// Objects with distinct hashes; several names often share one blob.
    pub fn unique_objects(&self) -> Vec<&AssetObject> {
        let mut seen = BTreeSet::new();
        self.objects
            .values()
            .filter(|obj| seen.insert(obj.hash.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_bytes() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "objects": {
                "minecraft/sounds/a.ogg": {"hash": "ab12cd", "size": 3},
                "minecraft/sounds/b.ogg": {"hash": "ab12cd", "size": 3},
                "icons/icon_16x16.png": {"hash": "ff00ee", "size": 8}
            }
        }))
        .unwrap()
    }

    #[test]
    fn objects_are_sharded_by_hash_prefix() {
        let fetched = FetchedAssetIndex::from_parts("12", index_bytes()).unwrap();
        let object = &fetched.index.objects["icons/icon_16x16.png"];

        assert_eq!(object.object_path(), "assets/objects/ff/ff00ee");
        assert_eq!(
            object.url("https://resources.download.minecraft.net/"),
            "https://resources.download.minecraft.net/ff/ff00ee"
        );
        assert_eq!(fetched.index_path(), "assets/indexes/12.json");
    }

    #[test]
    fn duplicate_hashes_are_listed_once() {
        let fetched = FetchedAssetIndex::from_parts("12", index_bytes()).unwrap();
        assert_eq!(fetched.index.unique_objects().len(), 2);
    }
}
