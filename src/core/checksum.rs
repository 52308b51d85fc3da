// ─── Checksums ───
// SHA-1 addresses every manifest entry; SHA-256 is accepted by connectors too.

use std::path::Path;

use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::core::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Sha1,
    Sha256,
}

impl ChecksumKind {
    /// Lowercase hex digest of `bytes`.
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            ChecksumKind::Sha1 => sha1_hex(bytes),
            ChecksumKind::Sha256 => sha256_hex(bytes),
        }
    }

    /// Compare against an expected digest, ignoring hex case.
    pub fn matches(self, bytes: &[u8], expected: &str) -> bool {
        self.digest(bytes).eq_ignore_ascii_case(expected.trim())
    }
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-1 of a local file, `None` when it cannot be read.
pub async fn file_sha1(path: &Path) -> Option<String> {
    tokio::fs::read(path).await.ok().map(|bytes| sha1_hex(&bytes))
}

/// Reject a payload whose SHA-1 differs from the advertised one.
pub fn verify_sha1(label: &str, bytes: &[u8], expected: &str) -> SyncResult<()> {
    let actual = sha1_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(SyncError::Sha1Mismatch {
            path: label.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
