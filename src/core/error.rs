use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the synchronization engine.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Transport ───────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("SSH session error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("{0} connector is not connected")]
    NotConnected(&'static str),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // ── Configuration ───────────────────────────────────
    #[error("No connector registered for uri {0}")]
    UnknownScheme(String),

    #[error("Invalid connector uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Manifest unavailable at {location}: {source}")]
    ManifestUnavailable {
        location: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Path {0:?} is not a normalized relative path")]
    UnsafePath(String),

    #[error("Invalid keep pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Version {0} not found in version manifest")]
    VersionNotFound(String),

    #[error("Runtime component {component} not available for {platform}")]
    RuntimeNotFound { component: String, platform: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("No Java {major} installation found for {arch}")]
    JavaNotFound { major: u32, arch: String },

    // ── Capability ──────────────────────────────────────
    #[error("{scheme} connector does not support {operation}")]
    Unsupported {
        scheme: &'static str,
        operation: &'static str,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(value: tokio::task::JoinError) -> Self {
        SyncError::TaskJoin(value.to_string())
    }
}

impl SyncError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
