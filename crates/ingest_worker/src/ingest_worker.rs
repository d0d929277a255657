use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use corral_domain::{BroadcastHub, HibernationSweeper, PositionStore, TelemetryRecorder};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::hibernation::HibernationMonitor;
use crate::udp::UdpTelemetryListener;

pub struct IngestWorkerConfig {
    pub udp_bind_addr: String,
    pub hibernation_timeout_ms: i64,
    pub sweep_interval_ms: u64,
}

/// Ingestion side of the pipeline: the UDP listener, the broadcast pump
/// and the hibernation monitor, wired onto one store and one hub.
pub struct IngestWorker {
    listener: UdpTelemetryListener,
    hub: Arc<BroadcastHub>,
    updates_rx: mpsc::UnboundedReceiver<String>,
    monitor: HibernationMonitor,
}

impl IngestWorker {
    pub fn new(
        store: Arc<dyn PositionStore>,
        hub: Arc<BroadcastHub>,
        config: IngestWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing ingest worker");

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let recorder = TelemetryRecorder::new(store.clone());
        let listener = UdpTelemetryListener::bind(&config.udp_bind_addr, recorder, updates_tx)?;

        let sweeper = Arc::new(HibernationSweeper::new(store, config.hibernation_timeout_ms));
        let monitor =
            HibernationMonitor::new(sweeper, Duration::from_millis(config.sweep_interval_ms));

        info!("Ingest worker initialized");

        Ok(Self {
            listener,
            hub,
            updates_rx,
            monitor,
        })
    }

    /// Address the UDP listener bound, useful when port 0 was requested.
    pub fn udp_local_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn into_runner_processes(
        self,
    ) -> Vec<
        Box<
            dyn FnOnce(
                    CancellationToken,
                ) -> std::pin::Pin<
                    Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
                > + Send,
        >,
    > {
        vec![
            // UDP receive loop, moved onto the blocking pool
            Box::new({
                let listener = self.listener;
                move |ctx| {
                    Box::pin(async move {
                        tokio::task::spawn_blocking(move || listener.run(ctx))
                            .await
                            .context("UDP listener task failed")?
                    })
                }
            }),
            // Broadcast pump draining the listener channel
            Box::new({
                let hub = self.hub;
                let updates_rx = self.updates_rx;
                move |ctx| {
                    Box::pin(async move {
                        hub.run(updates_rx, ctx).await;
                        Ok(())
                    })
                }
            }),
            // Hibernation monitor
            Box::new({
                let monitor = self.monitor;
                move |ctx| Box::pin(async move { monitor.run(ctx).await })
            }),
        ]
    }
}
