// ─── Packs ───
// Manifest model, the local game folder and the build/publish passes over it.

mod build;
mod folder;
mod keep;
mod model;
mod publish;

pub use build::BuildReport;
pub use folder::{resolve_arguments, GameFolder};
pub use keep::{KeepMatch, KeepSet, DEFAULT_KEEP_PATTERNS};
pub use model::{
    join_path, validate_relative_path, Argument, ArgumentValue, FileCategory, FileEntry, Manifest,
    ManifestArguments, ASSETS_DIR, CLIENT_JAR, LIBRARIES_DIR, MANIFEST_FILE, NATIVES_DIR,
    RUNTIME_DIR,
};
pub use publish::{publish, PublishReport};
