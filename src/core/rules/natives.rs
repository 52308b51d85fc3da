// ─── Native Classifiers ───
// Locates the platform-specific payloads of a library: either the library's
// own artifact is a `natives-*` jar, or it lists classifier artifacts.

use std::collections::BTreeMap;

use super::environment::Platform;
use super::evaluator::Rule;
use crate::core::version::LibraryArtifact;

/// A native artifact paired with the synthesized rules of the platform it
/// belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeClassifier {
    pub platform: Platform,
    pub artifact: LibraryArtifact,
    pub rules: Vec<Rule>,
}

impl NativeClassifier {
    fn new(platform: Platform, artifact: &LibraryArtifact) -> Self {
        Self {
            platform,
            artifact: artifact.clone(),
            rules: platform.create_rules(),
        }
    }
}

/// Collect the native payloads of one library.
///
/// Platforms are visited in [`Platform::ALL`] order. The first platform whose
/// classifier suffix matches the primary artifact's own path wins and stops
/// the search; classifier-map hits for earlier platforms are kept. Otherwise
/// each platform contributes at most one classifier-map artifact.
pub fn extract_native_classifier(
    artifact: Option<&LibraryArtifact>,
    classifiers: &BTreeMap<String, LibraryArtifact>,
) -> Vec<NativeClassifier> {
    let mut found = Vec::new();

    for platform in Platform::ALL {
        for key in platform.classifier_keys() {
            if let Some(artifact) = artifact {
                if artifact.path.contains("natives-")
                    && artifact.path.ends_with(&format!("{key}.jar"))
                {
                    found.push(NativeClassifier::new(platform, artifact));
                    return found;
                }
            }

            if let Some(classified) = classifiers.get(*key) {
                found.push(NativeClassifier::new(platform, classified));
                break;
            }
        }
    }

    found
}
