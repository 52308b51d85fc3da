use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{read_capacity, redact_uri, Connector};
use crate::core::error::{SyncError, SyncResult};
use crate::core::http::build_http_client;

/// A read-only pack served over plain HTTP(S) GETs.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    base_url: String,
    secured: bool,
    client: Client,
}

impl HttpConnector {
    pub fn from_uri(uri: &str) -> SyncResult<Self> {
        let parsed = Url::parse(uri).map_err(|e| SyncError::InvalidUri {
            uri: redact_uri(uri),
            reason: e.to_string(),
        })?;
        if parsed.host_str().is_none() {
            return Err(SyncError::InvalidUri {
                uri: redact_uri(uri),
                reason: "missing host".into(),
            });
        }

        Ok(Self {
            base_url: uri.to_string(),
            secured: parsed.scheme() == "https",
            client: build_http_client()?,
        })
    }

    /// Join the base URL and a pack-relative path with exactly one `/`,
    /// percent-encoding each path segment.
    pub fn url_for(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .trim_start_matches('/')
            .split('/')
            .map(urlencoding::encode)
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }

    fn unsupported(&self, operation: &'static str) -> SyncError {
        SyncError::Unsupported {
            scheme: self.scheme(),
            operation,
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    fn scheme(&self) -> &'static str {
        if self.secured {
            "https"
        } else {
            "http"
        }
    }

    fn uri(&self) -> String {
        redact_uri(&self.base_url)
    }

    fn path(&self) -> &str {
        &self.base_url
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
        let url = self.url_for(path);
        let mut response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url,
                status: status.as_u16(),
            });
        }

        let advertised = response.content_length().unwrap_or_default();
        let mut buf = Vec::with_capacity(read_capacity(expected_size, advertised));
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        debug!("Fetched {} bytes from {}", buf.len(), url);
        Ok(buf)
    }

    async fn send_file_from_bytes(
        &self,
        _path: &str,
        _bytes: &[u8],
        _mode: Option<u32>,
    ) -> SyncResult<()> {
        Err(self.unsupported("send_file_from_bytes"))
    }

    async fn send_file(&self, _path: &str, _local: &std::path::Path) -> SyncResult<()> {
        Err(self.unsupported("send_file"))
    }

    async fn has_file(&self, path: &str) -> bool {
        match self.client.head(self.url_for(path)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
