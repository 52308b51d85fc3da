use async_trait::async_trait;
use tracing::{debug, info};

use super::{fetch_verified, GenerateContext, PackBuilder};
use crate::core::checksum::ChecksumKind;
use crate::core::error::SyncResult;
use crate::core::pack::{FileCategory, FileEntry, CLIENT_JAR};
use crate::core::version::DownloadArtifact;

/// The game client, stored as `minecraft.jar`.
pub struct ClientJarBuilder {
    artifact: DownloadArtifact,
}

impl ClientJarBuilder {
    pub fn new(artifact: DownloadArtifact) -> Self {
        Self { artifact }
    }
}

#[async_trait]
impl PackBuilder for ClientJarBuilder {
    type Output = FileEntry;

    async fn filter_elements(&self, ctx: &GenerateContext<'_>) -> SyncResult<Vec<String>> {
        let present = ctx
            .connector
            .has_file_with_checksum(CLIENT_JAR, ChecksumKind::Sha1, &self.artifact.sha1)
            .await;
        Ok(if present { Vec::new() } else { vec![CLIENT_JAR.to_string()] })
    }

    async fn download(&self, ctx: &GenerateContext<'_>) -> SyncResult<FileEntry> {
        if self.filter_elements(ctx).await?.is_empty() {
            debug!("{} already up to date", CLIENT_JAR);
        } else {
            info!("Downloading client jar from {}", self.artifact.url);
            let bytes = fetch_verified(ctx.client, &self.artifact.url, &self.artifact.sha1).await?;
            ctx.connector.send_file_from_bytes(CLIENT_JAR, &bytes, None).await?;
        }
        ctx.progress.report("Downloading client", 1, 1, CLIENT_JAR);

        Ok(FileEntry::new(
            CLIENT_JAR,
            self.artifact.size,
            self.artifact.sha1.as_str(),
            FileCategory::Jar,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::sha1_hex;
    use crate::core::error::SyncError;
    use crate::core::generator::testing::Fixture;

    fn artifact(fixture: &Fixture, bytes: &[u8]) -> DownloadArtifact {
        DownloadArtifact {
            sha1: sha1_hex(bytes),
            size: bytes.len() as u64,
            url: fixture.url("/client.jar"),
        }
    }

    #[tokio::test]
    async fn downloads_when_missing() {
        let fixture = Fixture::new().await;
        fixture.serve("/client.jar", b"client".to_vec(), 1).await;
        let builder = ClientJarBuilder::new(artifact(&fixture, b"client"));

        let entry = builder.download(&fixture.ctx()).await.unwrap();
        assert_eq!(entry.path, CLIENT_JAR);
        assert_eq!(entry.category, FileCategory::Jar);
        assert_eq!(fixture.read(CLIENT_JAR), b"client");
    }

    #[tokio::test]
    async fn matching_jar_is_not_downloaded_again() {
        let fixture = Fixture::new().await;
        fixture.serve("/client.jar", b"client".to_vec(), 0).await;
        fixture.store(CLIENT_JAR, b"client");
        let builder = ClientJarBuilder::new(artifact(&fixture, b"client"));

        assert!(builder.filter_elements(&fixture.ctx()).await.unwrap().is_empty());
        builder.download(&fixture.ctx()).await.unwrap();
    }

    #[tokio::test]
    async fn tampered_download_is_rejected() {
        let fixture = Fixture::new().await;
        fixture.serve("/client.jar", b"tampered".to_vec(), 1).await;
        let builder = ClientJarBuilder::new(artifact(&fixture, b"client"));

        let err = builder.download(&fixture.ctx()).await.unwrap_err();
        assert!(matches!(err, SyncError::Sha1Mismatch { .. }));
        assert!(!fixture.dest.path().join(CLIENT_JAR).exists());
    }
}
