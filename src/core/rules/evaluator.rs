// ─── Rule Evaluation ───
// Declarative allow/disallow predicates over platform, architecture and
// feature flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::environment::{Environment, Platform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// A runtime feature flag a caller can opt into (e.g. quick play).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Predicate key in rule `features` maps, e.g. `is_quick_play_singleplayer`.
    pub key: String,
    /// Launcher flag the feature maps to, e.g. `quickPlaySingleplayer`.
    pub flag: String,
    pub value: String,
}

impl Feature {
    pub fn new(key: impl Into<String>, flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flag: flag.into(),
            value: value.into(),
        }
    }
}

impl Rule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn for_os(action: RuleAction, name: &str, arch: Option<&str>) -> Self {
        Self {
            action,
            os: Some(OsRule {
                name: Some(name.to_string()),
                arch: arch.map(str::to_string),
            }),
            features: None,
        }
    }

    pub fn is_feature_gated(&self) -> bool {
        self.features.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Whether the OS/arch predicate of this rule matches `env`.
    pub fn applies_to(&self, env: &Environment) -> bool {
        let Some(os) = &self.os else {
            return true;
        };

        let name = os.name.as_deref().unwrap_or_default().to_ascii_lowercase();
        let name_matches = match env.platform {
            Platform::Windows | Platform::WindowsArm | Platform::WindowsX86 => name == "windows",
            Platform::Linux => name == "linux",
            // Mojang historically says "osx"; newer metadata says "macos".
            Platform::MacosIntel | Platform::MacosArm => name == "osx" || name == "macos",
        };

        match os.arch.as_deref().filter(|a| !a.is_empty()) {
            Some(arch) if name_matches => arch.eq_ignore_ascii_case(&env.arch),
            _ => name_matches,
        }
    }
}

/// Decide whether an artifact gated by `rules` belongs in `env`.
///
/// An empty sequence includes. Otherwise the last matching `allow` includes,
/// any matching `disallow` excludes immediately, and a feature-gated rule
/// anywhere in the sequence excludes: those artifacts are opt-in through
/// [`should_include_features`] only.
pub fn should_include(rules: &[Rule], env: &Environment) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        if rule.is_feature_gated() {
            return false;
        }
        if rule.applies_to(env) {
            match rule.action {
                RuleAction::Disallow => return false,
                RuleAction::Allow => allowed = true,
            }
        }
    }
    allowed
}

/// True when any rule requires a feature that is among `active` (with a
/// `true` requirement).
pub fn should_include_features(rules: &[Rule], active: &[Feature]) -> bool {
    rules
        .iter()
        .filter_map(|rule| rule.features.as_ref())
        .any(|required| {
            active
                .iter()
                .any(|feature| required.get(&feature.key).copied().unwrap_or(false))
        })
}

/// Convert upstream library rules into the gating stored on a manifest entry:
/// feature predicates are stripped, and a sequence without any OS predicate
/// collapses to no gating at all.
pub fn to_folder_rules(rules: &[Rule]) -> Option<Vec<Rule>> {
    if !rules.iter().any(|r| r.os.is_some()) {
        return None;
    }

    Some(
        rules
            .iter()
            .map(|r| Rule {
                action: r.action,
                os: r.os.clone(),
                features: None,
            })
            .collect(),
    )
}
