//! Basic example of using the corral runner
//!
//! This example demonstrates:
//! - Running multiple named concurrent processes
//! - Graceful shutdown on SIGTERM/SIGINT (Ctrl+C)
//! - Cleanup with closers
//!
//! Run with: cargo run --example basic_runner

use corral_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting runner example");

    let runner = Runner::new()
        // Ticks every second until shutdown
        .with_app_process(|ctx| async move {
            let mut counter = 0;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!("Counter process stopping gracefully at count: {}", counter);
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        counter += 1;
                        tracing::info!("Counter: {}", counter);
                    }
                }
            }
            Ok(())
        })
        // Fails after 30 seconds (if not cancelled first), taking the counter down with it
        .with_app_process(|ctx| async move {
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::info!("Error simulator stopping gracefully");
                    Ok(())
                }
                _ = tokio::time::sleep(Duration::from_secs(30)) => {
                    Err(anyhow::anyhow!("Simulated error after 30 seconds"))
                }
            }
        })
        .with_closer(|| async move {
            tracing::info!("Flushing buffers...");
            tokio::time::sleep(Duration::from_millis(300)).await;
            tracing::info!("Cleanup done");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(5));

    tracing::info!("Press Ctrl+C to trigger graceful shutdown");
    runner.run().await;
}
