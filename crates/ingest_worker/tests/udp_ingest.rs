use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use corral_domain::{InMemoryPositionStore, PositionStore, TelemetryRecorder};
use ingest_worker::UdpTelemetryListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

struct Harness {
    store: Arc<InMemoryPositionStore>,
    updates_rx: mpsc::UnboundedReceiver<String>,
    sender: UdpSocket,
    listener_addr: std::net::SocketAddr,
    token: CancellationToken,
    run_handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn start_listener() -> Harness {
    let store = Arc::new(InMemoryPositionStore::new());
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let listener_addr = socket.local_addr().unwrap();
    let listener =
        UdpTelemetryListener::from_socket(socket, TelemetryRecorder::new(store.clone()), updates_tx)
            .unwrap();

    let token = CancellationToken::new();
    let run_handle = tokio::task::spawn_blocking({
        let token = token.clone();
        move || listener.run(token)
    });

    Harness {
        store,
        updates_rx,
        sender: UdpSocket::bind("127.0.0.1:0").unwrap(),
        listener_addr,
        token,
        run_handle,
    }
}

async fn wait_for_tag(store: &InMemoryPositionStore, uid: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if store.snapshot().unwrap().iter().any(|s| s.uid == uid) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "telemetry for {uid} never reached the store"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_udp_datagrams_flow_into_store_and_broadcast_channel() {
    let mut harness = start_listener();

    // Garbage first: the loop must shrug it off.
    harness
        .sender
        .send_to(b"garbage that is not json", harness.listener_addr)
        .unwrap();

    let valid =
        br#"{"uid":"cow-17","deviceName":"Maple","data":{"pos":[4.2,1.1,0.3],"time":1700000005000}}"#;
    harness.sender.send_to(valid, harness.listener_addr).unwrap();

    wait_for_tag(&harness.store, "cow-17").await;

    let snapshot = harness.store.snapshot().unwrap();
    let cow = snapshot.iter().find(|s| s.uid == "cow-17").unwrap();
    assert!(cow.online);
    assert_eq!(cow.device_name.as_deref(), Some("Maple"));
    assert_eq!(cow.position.x, 4.2);
    assert_eq!(cow.position.y, 1.1);
    assert_eq!(cow.position.z, 0.3);
    assert_eq!(cow.last_seen_ms, 1_700_000_005_000);
    assert_eq!(harness.store.history_range(0, i64::MAX).unwrap().len(), 1);

    // Only the valid message was forwarded for broadcast, verbatim.
    let forwarded = timeout(Duration::from_secs(5), harness.updates_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forwarded.as_bytes(), &valid[..]);
    assert!(harness.updates_rx.try_recv().is_err());

    harness.token.cancel();
    harness.run_handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_listener_accumulates_history_across_tags() {
    let mut harness = start_listener();

    for (uid, time) in [("cow-1", 1_000), ("cow-2", 2_000), ("cow-1", 3_000)] {
        let payload =
            format!(r#"{{"uid":"{uid}","data":{{"pos":[1.0,2.0,0.0],"time":{time}}}}}"#);
        harness
            .sender
            .send_to(payload.as_bytes(), harness.listener_addr)
            .unwrap();
    }

    // Three accepted messages must come through the update channel.
    for _ in 0..3 {
        timeout(Duration::from_secs(5), harness.updates_rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    let snapshot = harness.store.snapshot().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(harness.store.history_range(0, i64::MAX).unwrap().len(), 3);

    // cow-1 reflects its most recent event.
    let cow1 = snapshot.iter().find(|s| s.uid == "cow-1").unwrap();
    assert_eq!(cow1.last_seen_ms, 3_000);

    harness.token.cancel();
    harness.run_handle.await.unwrap().unwrap();
}
