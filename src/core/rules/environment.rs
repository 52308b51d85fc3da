// ─── Execution Environment ───
// Host platform family + normalized architecture, detected once per process.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::evaluator::{OsRule, Rule, RuleAction};

/// Platforms a pack can carry payloads for.
///
/// Variant order is the fixed enumeration order used wherever platforms are
/// iterated (runtime fan-out, native classifier matching).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "windows")]
    Windows,
    #[serde(rename = "windows-arm64")]
    WindowsArm,
    #[serde(rename = "windows-x86")]
    WindowsX86,
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "macos")]
    MacosIntel,
    #[serde(rename = "macos-arm64")]
    MacosArm,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Windows,
        Platform::WindowsArm,
        Platform::WindowsX86,
        Platform::Linux,
        Platform::MacosIntel,
        Platform::MacosArm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::WindowsArm => "windows-arm64",
            Platform::WindowsX86 => "windows-x86",
            Platform::Linux => "linux",
            Platform::MacosIntel => "macos",
            Platform::MacosArm => "macos-arm64",
        }
    }

    /// OS name as it appears in upstream rule predicates.
    pub fn os_family(self) -> &'static str {
        match self {
            Platform::Windows | Platform::WindowsArm | Platform::WindowsX86 => "windows",
            Platform::Linux => "linux",
            Platform::MacosIntel | Platform::MacosArm => "osx",
        }
    }

    pub fn is_windows(self) -> bool {
        self.os_family() == "windows"
    }

    /// Architecture aliases accepted for this platform.
    pub fn archs(self) -> &'static [&'static str] {
        match self {
            Platform::Windows | Platform::Linux | Platform::MacosIntel => &["amd64", "x86_64"],
            Platform::WindowsArm | Platform::MacosArm => &["arm64", "aarch64"],
            Platform::WindowsX86 => &["x86", "i386", "386"],
        }
    }

    /// One `allow` rule per architecture alias of this platform.
    pub fn create_rules(self) -> Vec<Rule> {
        self.archs()
            .iter()
            .map(|arch| Rule {
                action: RuleAction::Allow,
                os: Some(OsRule {
                    name: Some(self.os_family().to_string()),
                    arch: Some((*arch).to_string()),
                }),
                features: None,
            })
            .collect()
    }

    /// Key of this platform in the managed-runtime catalog.
    pub fn runtime_catalog_key(self) -> &'static str {
        match self {
            Platform::Windows => "windows-x64",
            Platform::WindowsArm => "windows-arm64",
            Platform::WindowsX86 => "windows-x86",
            Platform::Linux => "linux",
            Platform::MacosIntel => "mac-os",
            Platform::MacosArm => "mac-os-arm64",
        }
    }

    /// Classifier keys / artifact suffixes that mark a native payload.
    pub fn classifier_keys(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &["windows", "natives-windows"],
            Platform::WindowsArm => &["windows", "natives-windows-arm64"],
            Platform::WindowsX86 => &["windows", "natives-windows-x86"],
            Platform::Linux => &["linux", "natives-linux", "natives-linux-64", "natives-linux-32"],
            Platform::MacosIntel => &["osx", "natives-macos", "natives-osx"],
            Platform::MacosArm => &["osx", "natives-macos-arm64"],
        }
    }

    /// Runtime executable inside `runtime/<platform>/`.
    pub fn runtime_binary(self) -> String {
        match self {
            Platform::MacosIntel | Platform::MacosArm => {
                format!("runtime/{}/jre.bundle/Contents/Home/bin/java", self.as_str())
            }
            Platform::Windows | Platform::WindowsArm | Platform::WindowsX86 => {
                format!("runtime/{}/bin/java.exe", self.as_str())
            }
            Platform::Linux => format!("runtime/{}/bin/java", self.as_str()),
        }
    }

    fn detect(os: &str, arch: &str) -> Platform {
        match (os, arch) {
            ("macos", "aarch64") => Platform::MacosArm,
            ("macos", _) => Platform::MacosIntel,
            ("windows", "aarch64") => Platform::WindowsArm,
            ("windows", "x86") => Platform::WindowsX86,
            ("windows", _) => Platform::Windows,
            _ => Platform::Linux,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The environment rule sequences are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub platform: Platform,
    /// `x86_64` | `aarch64` | `x86` | `arm` | raw target arch
    pub arch: String,
}

static HOST_ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    pub fn new(platform: Platform, arch: impl Into<String>) -> Self {
        Self {
            platform,
            arch: arch.into(),
        }
    }

    /// Host environment, derived on first use and immutable afterwards.
    pub fn current() -> &'static Environment {
        HOST_ENVIRONMENT.get_or_init(|| {
            let arch = normalize_arch(std::env::consts::ARCH);
            Environment {
                platform: Platform::detect(std::env::consts::OS, &arch),
                arch,
            }
        })
    }
}

pub(crate) fn normalize_arch(raw: &str) -> String {
    match raw {
        "x86_64" | "amd64" => "x86_64".to_string(),
        "aarch64" | "arm64" => "aarch64".to_string(),
        "x86" | "i386" | "i686" | "386" => "x86".to_string(),
        other => other.to_string(),
    }
}
