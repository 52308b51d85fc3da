use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{fetch_verified, GenerateContext, PackBuilder};
use crate::core::checksum::{sha1_hex, ChecksumKind};
use crate::core::error::SyncResult;
use crate::core::pack::{join_path, FileCategory, FileEntry, LIBRARIES_DIR};
use crate::core::rules::{extract_native_classifier, to_folder_rules, NativeClassifier};
use crate::core::version::{Library, LibraryArtifact};

/// Plain library jars, plus the native payloads found along the way for the
/// natives stage.
pub struct LibrariesBuilder {
    libraries: Vec<Library>,
}

#[derive(Debug, Default)]
pub struct LibrariesOutput {
    pub files: Vec<FileEntry>,
    pub natives: Vec<NativeClassifier>,
}

struct PlainArtifact<'a> {
    library: &'a Library,
    artifact: &'a LibraryArtifact,
    path: String,
}

impl LibrariesBuilder {
    pub fn new(libraries: Vec<Library>) -> Self {
        Self { libraries }
    }

    /// Natives of every library, in library order.
    fn natives(&self) -> Vec<NativeClassifier> {
        self.libraries
            .iter()
            .flat_map(|lib| {
                let downloads = &lib.downloads;
                extract_native_classifier(downloads.artifact.as_ref(), &downloads.classifiers)
            })
            .collect()
    }

    /// Artifacts stored under `libraries/`. A jar that is itself a native
    /// payload belongs to the natives stage; duplicated paths keep the first
    /// library.
    fn plain_artifacts(&self) -> Vec<PlainArtifact<'_>> {
        let mut seen = HashSet::new();
        let mut plain = Vec::new();

        for library in &self.libraries {
            let Some(artifact) = library.downloads.artifact.as_ref() else {
                continue;
            };
            if artifact.path.is_empty() {
                continue;
            }

            let natives = extract_native_classifier(Some(artifact), &library.downloads.classifiers);
            if natives.iter().any(|n| n.artifact.path == artifact.path) {
                continue;
            }

            let path = join_path(&[LIBRARIES_DIR, &artifact.path]);
            if seen.insert(path.clone()) {
                plain.push(PlainArtifact { library, artifact, path });
            } else {
                debug!("{} listed twice, keeping the first", path);
            }
        }
        plain
    }
}

#[async_trait]
impl PackBuilder for LibrariesBuilder {
    type Output = LibrariesOutput;

    async fn filter_elements(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>> {
        let mut pending = Vec::new();
        for plain in self.plain_artifacts() {
            let present = if plain.artifact.sha1.is_empty() {
                ctx.connector.has_file(&plain.path).await
            } else {
                ctx.connector
                    .has_file_with_checksum(&plain.path, ChecksumKind::Sha1, &plain.artifact.sha1)
                    .await
            };
            if !present {
                pending.push(plain.path);
            }
        }
        Ok(pending)
    }

    async fn download(&self, ctx: &GenerateContext<'_>) -> SyncResult<LibrariesOutput> {
        let pending: HashSet<String> = self.filter_elements(ctx).await?.into_iter().collect();
        let total = pending.len();
        info!("{} libraries, {} to download", self.libraries.len(), total);

        let mut output = LibrariesOutput {
            files: Vec::new(),
            natives: self.natives(),
        };
        let mut done = 0;

        for plain in self.plain_artifacts() {
            let artifact = plain.artifact;
            let (sha, size) = if pending.contains(&plain.path) {
                let bytes = fetch_verified(ctx.client, &artifact.url, &artifact.sha1).await?;
                ctx.connector.send_file_from_bytes(&plain.path, &bytes, None).await?;
                done += 1;
                ctx.progress
                    .report("Downloading libraries", done, total, &plain.library.name);
                (sha1_hex(&bytes), bytes.len() as u64)
            } else if artifact.sha1.is_empty() {
                // Stored earlier without a published hash.
                let bytes = ctx.connector.read_file_bytes(&plain.path, None).await?;
                (sha1_hex(&bytes), bytes.len() as u64)
            } else {
                (artifact.sha1.to_ascii_lowercase(), artifact.size)
            };

            output.files.push(
                FileEntry::new(plain.path, size, sha, FileCategory::Libraries)
                    .with_rules(to_folder_rules(&plain.library.rules)),
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generator::testing::Fixture;
    use crate::core::rules::{Platform, Rule, RuleAction};
    use crate::core::version::LibraryDownloads;

    fn artifact(fixture: &Fixture, path: &str, bytes: &[u8], with_sha: bool) -> LibraryArtifact {
        LibraryArtifact {
            path: path.to_string(),
            sha1: if with_sha { sha1_hex(bytes) } else { String::new() },
            size: bytes.len() as u64,
            url: fixture.url(&format!("/maven/{path}")),
        }
    }

    fn library(name: &str, artifact: Option<LibraryArtifact>, rules: Vec<Rule>) -> Library {
        Library {
            name: name.to_string(),
            downloads: LibraryDownloads {
                artifact,
                classifiers: Default::default(),
            },
            rules,
        }
    }

    #[tokio::test]
    async fn plain_jars_are_stored_with_os_rules() {
        let fixture = Fixture::new().await;
        fixture.serve("/maven/com/mojang/brigadier.jar", b"brig".to_vec(), 1).await;
        fixture.serve("/maven/ca/weblite/objc.jar", b"objc".to_vec(), 1).await;

        let builder = LibrariesBuilder::new(vec![
            library(
                "com.mojang:brigadier:1.2.9",
                Some(artifact(&fixture, "com/mojang/brigadier.jar", b"brig", true)),
                Vec::new(),
            ),
            library(
                "ca.weblite:java-objc-bridge:1.1",
                Some(artifact(&fixture, "ca/weblite/objc.jar", b"objc", true)),
                vec![Rule::for_os(RuleAction::Allow, "osx", None)],
            ),
        ]);
        let output = builder.download(&fixture.ctx()).await.unwrap();

        assert_eq!(output.files.len(), 2);
        assert!(output.natives.is_empty());
        assert_eq!(output.files[0].path, "libraries/com/mojang/brigadier.jar");
        assert!(output.files[0].rules.is_none());
        assert_eq!(output.files[1].rules().len(), 1);
        assert_eq!(fixture.read("libraries/ca/weblite/objc.jar"), b"objc");
    }

    #[tokio::test]
    async fn native_jars_are_handed_to_the_natives_stage() {
        let fixture = Fixture::new().await;
        fixture
            .serve("/maven/org/lwjgl/lwjgl-3.3.3-natives-linux.jar", b"zip".to_vec(), 0)
            .await;

        let builder = LibrariesBuilder::new(vec![library(
            "org.lwjgl:lwjgl:3.3.3:natives-linux",
            Some(artifact(&fixture, "org/lwjgl/lwjgl-3.3.3-natives-linux.jar", b"zip", true)),
            Vec::new(),
        )]);
        let output = builder.download(&fixture.ctx()).await.unwrap();

        assert!(output.files.is_empty());
        assert_eq!(output.natives.len(), 1);
        assert_eq!(output.natives[0].platform, Platform::Linux);
    }

    #[tokio::test]
    async fn missing_hash_is_computed_from_the_payload() {
        let fixture = Fixture::new().await;
        fixture.serve("/maven/net/fabricmc/loader.jar", b"loader".to_vec(), 1).await;

        let builder = LibrariesBuilder::new(vec![library(
            "net.fabricmc:fabric-loader:0.15.0",
            Some(artifact(&fixture, "net/fabricmc/loader.jar", b"loader", false)),
            Vec::new(),
        )]);

        let first = builder.download(&fixture.ctx()).await.unwrap();
        assert_eq!(first.files[0].sha, sha1_hex(b"loader"));

        // Stored now, so the second pass reads it back instead of downloading.
        let second = builder.download(&fixture.ctx()).await.unwrap();
        assert_eq!(second.files[0].sha, sha1_hex(b"loader"));
        assert_eq!(second.files[0].size, 6);
    }

    #[tokio::test]
    async fn duplicate_paths_are_listed_once() {
        let fixture = Fixture::new().await;
        fixture.serve("/maven/org/ow2/asm.jar", b"asm".to_vec(), 1).await;
        let asm = artifact(&fixture, "org/ow2/asm.jar", b"asm", true);

        let builder = LibrariesBuilder::new(vec![
            library("org.ow2.asm:asm:9.6", Some(asm.clone()), Vec::new()),
            library("org.ow2.asm:asm:9.6", Some(asm), Vec::new()),
            library("empty", None, Vec::new()),
        ]);
        assert_eq!(builder.download(&fixture.ctx()).await.unwrap().files.len(), 1);
    }
}
