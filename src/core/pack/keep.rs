// ─── KeepSet ───
// Local files that survive reconciliation although no manifest lists them.

use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::core::error::{SyncError, SyncResult};

/// Patterns every game folder protects out of the box.
pub const DEFAULT_KEEP_PATTERNS: [&str; 3] = ["options.txt", "logs/*", "resourcepacks/*"];

#[derive(Debug, Clone, Default)]
pub struct KeepSet {
    exact: Vec<String>,
    globs: Vec<(String, GlobMatcher)>,
    regexes: Vec<Regex>,
}

/// Which registration protected a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepMatch {
    Exact(String),
    Glob(String),
    Regex(String),
}

impl KeepSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default protection list.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        for pattern in DEFAULT_KEEP_PATTERNS {
            // the defaults are known-good globs
            if let Ok(glob) = Glob::new(pattern) {
                set.globs.push((pattern.to_string(), glob.compile_matcher()));
            }
        }
        set
    }

    /// Protect one path, relative to the folder root or absolute.
    pub fn keep_exact(&mut self, path: impl Into<String>) {
        self.exact.push(path.into());
    }

    /// Protect every relative path matching a shell glob (`*` crosses `/`).
    pub fn keep_glob(&mut self, pattern: &str) -> SyncResult<()> {
        let glob = Glob::new(pattern).map_err(|e| SyncError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })?;
        self.globs.push((pattern.to_string(), glob.compile_matcher()));
        Ok(())
    }

    /// Protect every relative path containing a match of `pattern`.
    pub fn keep_regex(&mut self, pattern: &str) -> SyncResult<()> {
        let regex = Regex::new(pattern).map_err(|e| SyncError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.regexes.push(regex);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.globs.is_empty() && self.regexes.is_empty()
    }

    /// Exact entries first, then globs, then regexes; first hit wins.
    pub fn find_match(&self, relative: &str, absolute: &Path) -> Option<KeepMatch> {
        let absolute_str = absolute.to_string_lossy();

        if let Some(hit) = self
            .exact
            .iter()
            .find(|e| e.as_str() == relative || e.as_str() == absolute_str)
        {
            return Some(KeepMatch::Exact(hit.clone()));
        }

        if let Some((pattern, _)) = self.globs.iter().find(|(_, m)| m.is_match(relative)) {
            return Some(KeepMatch::Glob(pattern.clone()));
        }

        self.regexes
            .iter()
            .find(|r| r.is_match(relative))
            .map(|r| KeepMatch::Regex(r.as_str().to_string()))
    }

    pub fn matches(&self, relative: &str, absolute: &Path) -> bool {
        self.find_match(relative, absolute).is_some()
    }
}
