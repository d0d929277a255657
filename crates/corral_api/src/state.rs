use std::sync::Arc;

use corral_domain::{BroadcastHub, TagQueryService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub query: Arc<TagQueryService>,
    pub hub: Arc<BroadcastHub>,
    pub udp_port: u16,
}

impl AppState {
    pub fn new(query: Arc<TagQueryService>, hub: Arc<BroadcastHub>, udp_port: u16) -> Self {
        Self {
            query,
            hub,
            udp_port,
        }
    }
}
