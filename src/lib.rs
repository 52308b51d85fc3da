pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::connectors::{find_connector_from_uri, AnyConnector};
pub use crate::core::error::{SyncError, SyncResult};
pub use crate::core::generator::{GenerateContext, PackGenerator, UpstreamMetadata};
pub use crate::core::pack::{publish, BuildReport, GameFolder, Manifest, PublishReport};
pub use crate::core::progress::Progress;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter; a second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packsync=debug")),
        )
        .try_init();
}
