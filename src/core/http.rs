use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Method};
use tracing::debug;

use crate::core::error::{SyncError, SyncResult};

const APP_USER_AGENT: &str = concat!("packsync/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// Issue a request and return the body, mapping non-2xx statuses to
/// `DownloadFailed`.
pub async fn request_bytes(client: &Client, method: Method, url: &str) -> SyncResult<Vec<u8>> {
    let response = client.request(method, url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

pub async fn fetch_bytes(client: &Client, url: &str) -> SyncResult<Vec<u8>> {
    request_bytes(client, Method::GET, url).await
}

pub async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> SyncResult<T> {
    let bytes = fetch_bytes(client, url).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
