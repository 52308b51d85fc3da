// ─── Java Runtime Discovery ───
// Locating a `java` executable for a required major version and architecture.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::GameFolder;
use crate::core::rules::normalize_arch;

/// Deadline shared by all candidate checks.
pub const CHECK_DEADLINE: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
    /// Normalized `os.arch`, when `java -version` reported one.
    pub arch: Option<String>,
}

impl JavaInstallation {
    pub fn satisfies(&self, major: u32, required_arch: Option<&str>) -> bool {
        if self.major < major {
            return false;
        }
        match required_arch {
            Some(arch) => self.arch.as_deref() == Some(normalize_arch(arch).as_str()),
            None => true,
        }
    }
}

#[async_trait]
pub trait RuntimeDiscovery: Send + Sync {
    async fn find_java(&self, major: u32, required_arch: Option<&str>) -> SyncResult<PathBuf>;
}

// ── System installations ──

/// Searches `JAVA_HOME` and `PATH` for usable installations.
#[derive(Debug, Clone)]
pub struct SystemJavaDiscovery {
    candidates: Vec<PathBuf>,
    deadline: Duration,
}

impl SystemJavaDiscovery {
    /// `JAVA_HOME/bin/java` first, then every `PATH` entry in order.
    pub fn from_environment() -> Self {
        let mut candidates = Vec::new();
        if let Some(home) = std::env::var_os("JAVA_HOME") {
            candidates.push(PathBuf::from(home).join("bin").join(java_exe()));
        }
        if let Some(path) = std::env::var_os("PATH") {
            candidates.extend(std::env::split_paths(&path).map(|dir| dir.join(java_exe())));
        }
        Self::with_candidates(candidates)
    }

    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        Self {
            candidates: unique,
            deadline: CHECK_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Every candidate that answers `-version` before the deadline.
    pub async fn installations(&self) -> Vec<JavaInstallation> {
        let deadline = Instant::now() + self.deadline;
        let mut found = Vec::new();

        for candidate in &self.candidates {
            match tokio::time::timeout_at(deadline, inspect_java(candidate)).await {
                Ok(Some(installation)) => {
                    debug!(
                        "Found Java {} at {:?} ({:?})",
                        installation.version, installation.path, installation.arch
                    );
                    found.push(installation);
                }
                Ok(None) => {}
                Err(_) => {
                    warn!("Java check deadline reached at {:?}", candidate);
                    break;
                }
            }
        }
        found
    }
}

#[async_trait]
impl RuntimeDiscovery for SystemJavaDiscovery {
    async fn find_java(&self, major: u32, required_arch: Option<&str>) -> SyncResult<PathBuf> {
        self.installations()
            .await
            .into_iter()
            .find(|i| i.satisfies(major, required_arch))
            .map(|i| i.path)
            .ok_or_else(|| SyncError::JavaNotFound {
                major,
                arch: required_arch.unwrap_or("any arch").to_string(),
            })
    }
}

// ── Bundled runtime ──

/// The runtime a game folder ships, falling back to another discovery when
/// the pack has none for this host or it has not been built yet.
pub struct BundledRuntime<D> {
    binary: Option<PathBuf>,
    fallback: D,
}

impl<D: RuntimeDiscovery> BundledRuntime<D> {
    pub fn new(folder: &GameFolder, fallback: D) -> Self {
        Self {
            binary: folder.runtime_binary().ok(),
            fallback,
        }
    }
}

#[async_trait]
impl<D: RuntimeDiscovery> RuntimeDiscovery for BundledRuntime<D> {
    async fn find_java(&self, major: u32, required_arch: Option<&str>) -> SyncResult<PathBuf> {
        if let Some(binary) = &self.binary {
            if tokio::fs::metadata(binary).await.is_ok_and(|m| m.is_file()) {
                return Ok(binary.clone());
            }
            debug!("Bundled runtime {:?} missing, probing the system", binary);
        }
        self.fallback.find_java(major, required_arch).await
    }
}

// ── Probing ──

async fn inspect_java(path: &Path) -> Option<JavaInstallation> {
    if !tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
        return None;
    }

    let output = tokio::process::Command::new(path)
        .args(["-XshowSettings:properties", "-version"])
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );

    let (version, arch) = parse_version_output(&text)?;
    Some(JavaInstallation {
        path: path.to_path_buf(),
        major: parse_major_version(&version),
        version,
        arch,
    })
}

/// Quoted version from the banner line and `os.arch` from the property dump.
fn parse_version_output(text: &str) -> Option<(String, Option<String>)> {
    let version = text
        .lines()
        .filter(|line| line.contains("version \""))
        .find_map(|line| {
            let start = line.find('"')?;
            let end = line[start + 1..].find('"')?;
            Some(line[start + 1..start + 1 + end].to_string())
        })?;

    let arch = text.lines().find_map(|line| {
        let (key, value) = line.trim().split_once('=')?;
        (key.trim() == "os.arch").then(|| normalize_arch(value.trim()))
    });

    Some((version, arch))
}

/// `1.8.0_392` -> 8, `17.0.8` -> 17, `21` -> 21
fn parse_major_version(version: &str) -> u32 {
    let mut parts = version.split(['.', '_', '-', '+']);
    let first: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    if first == 1 {
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(first)
    } else {
        first
    }
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}
