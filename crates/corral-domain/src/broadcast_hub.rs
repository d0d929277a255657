use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::DeliveryError;

/// Identifier handed out by [`BroadcastHub::connect`], used to disconnect.
pub type SessionId = u64;

/// One connected live-update observer.
///
/// `deliver` must be a non-blocking enqueue. A failure means the session is
/// unreachable and the hub will drop it.
#[cfg_attr(test, mockall::automock)]
pub trait SubscriberSession: Send + Sync {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Fan-out of accepted telemetry to every connected subscriber.
///
/// The hub owns the subscriber registry. Delivery is best-effort: a failing
/// subscriber is pruned without disturbing the others, and nothing is
/// retried or buffered for it.
pub struct BroadcastHub {
    sessions: RwLock<HashMap<SessionId, Arc<dyn SubscriberSession>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber and return the id to disconnect it later.
    pub async fn connect(&self, session: Arc<dyn SubscriberSession>) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
        info!(session_id = id, subscribers = sessions.len(), "Subscriber connected");
        id
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub async fn disconnect(&self, id: SessionId) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(&id).is_some() {
            info!(session_id = id, subscribers = sessions.len(), "Subscriber disconnected");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Deliver one message to every subscriber, pruning the ones that fail.
    pub async fn broadcast(&self, message: &str) {
        let mut unreachable: Vec<SessionId> = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                if let Err(e) = session.deliver(message) {
                    warn!(session_id = id, error = %e, "Dropping unreachable subscriber");
                    unreachable.push(*id);
                }
            }
        }

        if !unreachable.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in unreachable {
                sessions.remove(&id);
            }
        }
    }

    /// Drain the ingest channel, broadcasting each message in arrival order.
    ///
    /// Runs until the channel closes or the token fires.
    pub async fn run(
        self: Arc<Self>,
        mut updates: UnboundedReceiver<String>,
        cancellation_token: CancellationToken,
    ) {
        info!("Broadcast pump started");
        loop {
            tokio::select! {
                maybe_update = updates.recv() => {
                    match maybe_update {
                        Some(message) => self.broadcast(&message).await,
                        None => {
                            info!("Update channel closed, stopping broadcast pump");
                            break;
                        }
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Broadcast pump received cancellation signal");
                    break;
                }
            }
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
