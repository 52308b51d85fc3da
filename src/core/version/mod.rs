pub mod fabric;
pub mod manifest;
pub mod runtime;
pub mod version_file;

pub use fabric::{FabricArguments, FabricLibrary, FabricProfile};
pub use manifest::{LatestVersions, VersionEntry, VersionManifest};
pub use runtime::{
    JavaRuntimeManifest, RuntimeCatalog, RuntimeDownloads, RuntimeFile, RuntimeFileKind,
    RuntimeRelease,
};
pub use version_file::{
    AssetIndexInfo, DownloadArtifact, JavaVersionInfo, Library, LibraryArtifact, LibraryDownloads,
    VersionDownloads, VersionJson,
};
