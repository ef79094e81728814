//! Fire-and-forget dispatch of mirror pushes.

use crate::client::MirrorClient;
use crate::partition::OwnerSubsets;
use tracing::{info, warn};

/// Background mirror synchronizer.
///
/// [`MirrorSync::dispatch`] spawns the push onto the Tokio runtime and
/// returns immediately; the caller's write path is never blocked on the
/// network. Outcomes are observed only via logging.
#[derive(Debug, Clone)]
pub struct MirrorSync {
    client: MirrorClient,
}

impl MirrorSync {
    /// Creates a synchronizer over the given client.
    pub fn new(client: MirrorClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client, e.g. for a startup health probe.
    #[must_use]
    pub fn client(&self) -> &MirrorClient {
        &self.client
    }

    /// Spawns one background push of the given subsets.
    ///
    /// The authoritative write must already be durable when this is
    /// called. Each mutation dispatches exactly once; there are no
    /// retries across invocations. Must be called from within a Tokio
    /// runtime.
    pub fn dispatch(&self, subsets: OwnerSubsets) {
        let client = self.client.clone();
        tokio::spawn(async move {
            let summary = client.push_all(&subsets).await;
            if summary.all_ok() {
                info!(pushed = summary.pushed, "mirror push complete");
            } else {
                warn!(
                    pushed = summary.pushed,
                    failed = summary.failed,
                    "mirror push incomplete"
                );
            }
        });
    }
}
