use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use anyhow::Context;
use corral_domain::{parse_telemetry, TelemetryRecorder};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long a single receive blocks before the loop rechecks cancellation.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Largest datagram the listener reads. Tag payloads are a few hundred bytes.
const MAX_DATAGRAM_BYTES: usize = 4096;

/// Blocking UDP receive loop for tag telemetry.
///
/// Accepted datagrams are written through to the position store and their
/// raw text is handed to the broadcast pump. A malformed datagram is
/// dropped with a warning and never stops the loop.
pub struct UdpTelemetryListener {
    socket: UdpSocket,
    recorder: TelemetryRecorder,
    updates_tx: UnboundedSender<String>,
}

impl UdpTelemetryListener {
    /// Bind the listener socket. A bind failure is fatal to startup.
    pub fn bind(
        bind_addr: &str,
        recorder: TelemetryRecorder,
        updates_tx: UnboundedSender<String>,
    ) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .with_context(|| format!("Failed to bind UDP socket on {bind_addr}"))?;
        let listener = Self::from_socket(socket, recorder, updates_tx)?;
        info!(addr = %listener.local_addr()?, "UDP telemetry listener bound");
        Ok(listener)
    }

    /// Wrap an existing socket (used by tests with an ephemeral port).
    pub fn from_socket(
        socket: UdpSocket,
        recorder: TelemetryRecorder,
        updates_tx: UnboundedSender<String>,
    ) -> anyhow::Result<Self> {
        socket
            .set_read_timeout(Some(RECV_POLL_INTERVAL))
            .context("Failed to set UDP read timeout")?;
        Ok(Self {
            socket,
            recorder,
            updates_tx,
        })
    }

    /// Address the socket actually bound, useful when port 0 was requested.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("Failed to read UDP listener address")
    }

    /// Run the blocking receive loop until the token fires.
    ///
    /// Call from the blocking pool, never from an async context. A receive
    /// error other than the poll timeout is fatal to the listener.
    pub fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        info!("UDP telemetry listener started");
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];
        while !cancellation_token.is_cancelled() {
            match self.socket.recv_from(&mut buf) {
                Ok((len, _src)) => self.handle_datagram(&buf[..len]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    // Poll timeout, loop around and recheck the token
                }
                Err(e) => {
                    error!(error = %e, "UDP receive failed");
                    return Err(e).context("UDP receive failed");
                }
            }
        }
        info!("UDP telemetry listener stopped");
        Ok(())
    }

    /// Handle a single datagram. Public for unit testing.
    pub fn handle_datagram(&self, payload: &[u8]) {
        let event = match parse_telemetry(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, len = payload.len(), "Dropping malformed telemetry datagram");
                return;
            }
        };

        debug!(uid = %event.uid, timestamp_ms = event.timestamp_ms, "Accepted telemetry datagram");

        // 1. Write through to the store; failures are logged inside the recorder
        self.recorder.record(&event);

        // 2. Hand the raw message to the broadcast pump, regardless of store outcome
        let text = String::from_utf8_lossy(payload).into_owned();
        if self.updates_tx.send(text).is_err() {
            debug!("Broadcast pump is gone, dropping live update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_domain::{DomainResult, InMemoryPositionStore, PositionStore, TelemetryEvent};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Store stub whose writes always fail.
    struct BrokenStore;

    impl PositionStore for BrokenStore {
        fn upsert_state(&self, _event: &TelemetryEvent) -> DomainResult<()> {
            Err(anyhow::anyhow!("state write refused").into())
        }

        fn append_history(&self, _event: &TelemetryEvent) -> DomainResult<()> {
            Err(anyhow::anyhow!("history write refused").into())
        }

        fn mark_offline(&self, _uids: &[String], _cutoff_ms: i64) -> DomainResult<usize> {
            Err(anyhow::anyhow!("mark offline refused").into())
        }

        fn snapshot(&self) -> DomainResult<Vec<corral_domain::TagState>> {
            Ok(Vec::new())
        }

        fn history_range(
            &self,
            _start_ms: i64,
            _end_ms: i64,
        ) -> DomainResult<Vec<corral_domain::TagHistoryRecord>> {
            Ok(Vec::new())
        }
    }

    fn listener_with_store(
        store: Arc<dyn PositionStore>,
    ) -> (UdpTelemetryListener, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let listener =
            UdpTelemetryListener::from_socket(socket, TelemetryRecorder::new(store), tx).unwrap();
        (listener, rx)
    }

    #[test]
    fn test_accepted_datagram_is_stored_and_forwarded() {
        let store = Arc::new(InMemoryPositionStore::new());
        let (listener, mut rx) = listener_with_store(store.clone());

        let payload = br#"{"uid":"T1","deviceName":"Bessie","data":{"pos":[1.0,2.0,0.0],"time":1000}}"#;
        listener.handle_datagram(payload);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].uid, "T1");
        assert_eq!(snapshot[0].device_name.as_deref(), Some("Bessie"));
        assert_eq!(snapshot[0].position.x, 1.0);
        assert_eq!(snapshot[0].position.y, 2.0);
        assert!(snapshot[0].online);
        assert_eq!(store.history_range(0, 10_000).unwrap().len(), 1);

        let forwarded = rx.try_recv().unwrap();
        assert_eq!(forwarded.as_bytes(), payload);
    }

    #[test]
    fn test_malformed_datagram_touches_nothing() {
        let store = Arc::new(InMemoryPositionStore::new());
        let (listener, mut rx) = listener_with_store(store.clone());

        listener.handle_datagram(b"not json at all");
        listener.handle_datagram(&[0xff, 0xfe, 0x01]);
        listener.handle_datagram(br#"{"uid":"","data":{"pos":[1.0],"time":1}}"#);

        assert!(store.snapshot().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_store_failure_still_forwards_to_broadcast() {
        let (listener, mut rx) = listener_with_store(Arc::new(BrokenStore));

        let payload = br#"{"uid":"T1","data":{"pos":[1.0,2.0],"time":1000}}"#;
        listener.handle_datagram(payload);

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_handle_datagram_survives_closed_pump() {
        let store = Arc::new(InMemoryPositionStore::new());
        let (listener, rx) = listener_with_store(store.clone());
        drop(rx);

        let payload = br#"{"uid":"T1","data":{"pos":[1.0,2.0],"time":1000}}"#;
        listener.handle_datagram(payload);

        // The store write still happened even though nobody is listening.
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_run_stops_on_cancellation() {
        let store = Arc::new(InMemoryPositionStore::new());
        let (listener, _rx) = listener_with_store(store);

        let token = CancellationToken::new();
        token.cancel();

        // Already-cancelled token means the loop exits on its first check.
        listener.run(token).unwrap();
    }
}
