mod config;
mod telemetry;

use std::sync::Arc;

use config::ServiceConfig;
use corral_api::{create_router, ApiServer, AppState};
use corral_domain::{BroadcastHub, InMemoryPositionStore, TagQueryService};
use corral_runner::Runner;
use ingest_worker::{IngestWorker, IngestWorkerConfig};
use telemetry::init_telemetry;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_telemetry(&config.log_level);

    info!(
        udp_addr = %config.udp_bind_addr(),
        http_addr = %config.http_bind_addr(),
        "Starting corral-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    // Shared state: one store, one broadcast hub
    let store = Arc::new(InMemoryPositionStore::new());
    let hub = Arc::new(BroadcastHub::new());

    // Ingest side: UDP listener, broadcast pump, hibernation monitor
    let ingest_worker = match IngestWorker::new(
        store.clone(),
        hub.clone(),
        IngestWorkerConfig {
            udp_bind_addr: config.udp_bind_addr(),
            hibernation_timeout_ms: config.hibernation_timeout_ms,
            sweep_interval_ms: config.sweep_interval_ms,
        },
    ) {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize ingest worker: {}", e);
            std::process::exit(1);
        }
    };

    // Query side: HTTP API over the same store and hub
    let query = Arc::new(TagQueryService::new(store));
    let router = create_router(AppState::new(query, hub, config.udp_port));
    let api_server = ApiServer::new(config.http_bind_addr(), router);

    // Build runner with all processes
    let mut runner = Runner::new();
    for (i, process) in ingest_worker.into_runner_processes().into_iter().enumerate() {
        runner = runner.with_named_process(format!("ingest_worker_{}", i), process);
    }
    runner = runner.with_named_process(
        "corral_api",
        Box::new(move |token| Box::pin(api_server.run(token))),
    );

    // Run the service
    runner.run().await;
}
