// ─── Pack Manifest ───
// The hash-addressed description of every file a game folder should contain.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{SyncError, SyncResult};
use crate::core::rules::{Platform, Rule};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CLIENT_JAR: &str = "minecraft.jar";
pub const ASSETS_DIR: &str = "assets";
pub const LIBRARIES_DIR: &str = "libraries";
pub const NATIVES_DIR: &str = "natives";
pub const RUNTIME_DIR: &str = "runtime";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub main_class: String,
    /// Version of the synchronized tree itself.
    pub version: String,
    /// Underlying game version.
    #[serde(rename = "mcVersion")]
    pub game_version: String,
    #[serde(default)]
    pub arguments: ManifestArguments,
    pub asset_index: String,
    /// Runtime executable per platform, relative to the folder root.
    #[serde(rename = "javaBinaries", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime_binaries: BTreeMap<Platform, String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Manifest {
    pub fn from_slice(bytes: &[u8]) -> SyncResult<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json_bytes(&self) -> SyncResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Reject entries whose path could escape the folder root.
    pub fn validate(&self) -> SyncResult<()> {
        for file in &self.files {
            validate_relative_path(&file.path)?;
        }
        for binary in self.runtime_binaries.values() {
            validate_relative_path(binary)?;
        }
        Ok(())
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    pub fn files_of(&self, category: FileCategory) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(move |f| f.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub size: u64,
    pub path: String,
    /// Hex SHA-1 of the exact bytes stored at `path`.
    pub sha: String,
    #[serde(rename = "type")]
    pub category: FileCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub executable: bool,
}

impl FileEntry {
    pub fn new(
        path: impl Into<String>,
        size: u64,
        sha: impl Into<String>,
        category: FileCategory,
    ) -> Self {
        Self {
            size,
            path: path.into(),
            sha: sha.into(),
            category,
            rules: None,
            executable: false,
        }
    }

    pub fn with_rules(mut self, rules: Option<Vec<Rule>>) -> Self {
        self.rules = rules.filter(|r| !r.is_empty());
        self
    }

    pub fn with_executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }

    /// Unix permission bits the entry is written with.
    pub fn mode(&self) -> u32 {
        if self.executable {
            0o755
        } else {
            0o644
        }
    }

    pub fn rules(&self) -> &[Rule] {
        self.rules.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Jar,
    Runtime,
    Assets,
    Libraries,
    Natives,
    Extra,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCategory::Jar => "jar",
            FileCategory::Runtime => "runtime",
            FileCategory::Assets => "assets",
            FileCategory::Libraries => "libraries",
            FileCategory::Natives => "natives",
            FileCategory::Extra => "extra",
        };
        f.write_str(name)
    }
}

// ── Arguments ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// Either a literal or a rule-gated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Literal(String),
    Conditional { rules: Vec<Rule>, value: ArgumentValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            ArgumentValue::Single(v) => vec![v.clone()],
            ArgumentValue::Many(vs) => vs.clone(),
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Literal(value.to_string())
    }
}

// ── Paths ──

/// Manifest paths are `/`-separated, relative, and never leave the root.
pub fn validate_relative_path(path: &str) -> SyncResult<()> {
    let unsafe_path = || SyncError::UnsafePath(path.to_string());

    if path.is_empty() || path.starts_with('/') || path.starts_with('\\') {
        return Err(unsafe_path());
    }

    let mut components = path.split(['/', '\\']);
    if components.clone().next().is_some_and(|first| first.contains(':')) {
        return Err(unsafe_path());
    }
    if components.any(|c| c == "..") {
        return Err(unsafe_path());
    }
    Ok(())
}

/// Join manifest-style path segments with `/`.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
