//! A concurrent application runner that manages long-running processes with graceful shutdown.
//!
//! The runner orchestrates named app processes and cleanup functions, providing:
//! - Concurrent execution of multiple processes
//! - Graceful shutdown on SIGTERM/SIGINT
//! - A bounded grace window for processes to observe cancellation
//! - Cleanup execution with a configurable timeout, regardless of process outcome
//!
//! # Example
//!
//! ```no_run
//! use corral_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new()
//!         .with_app_process(|ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {
//!                         tracing::info!("Process stopping gracefully");
//!                         break;
//!                     }
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("Process working...");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("Cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5));
//!
//!     runner.run().await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Type alias for an app process function.
/// Takes a cancellation token and returns a future that resolves to Result<(), anyhow::Error>
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// Type alias for a closer function.
/// Returns a future that resolves to Result<(), anyhow::Error>
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

struct NamedProcess {
    name: String,
    process: AppProcess,
}

/// A concurrent application runner that manages long-running processes with graceful shutdown.
///
/// App processes run concurrently until one fails or a shutdown signal is received;
/// the first failure cancels every other process. Closers execute afterward,
/// regardless of how the processes stopped.
pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    process_grace: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a new Runner with default configuration.
    ///
    /// Default settings:
    /// - Closer timeout: 10 seconds
    /// - Process grace window after cancellation: 5 seconds
    /// - No app processes or closers
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            process_grace: Duration::from_secs(5),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds an app process under an automatically generated name.
    pub fn with_app_process<F, Fut>(self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        let name = format!("process_{}", self.processes.len());
        self.with_named_process(name, Box::new(|token| Box::pin(process(token))))
    }

    /// Adds a boxed app process under an explicit name.
    ///
    /// The name shows up in process lifecycle logs, which is what you want
    /// when several workers run side by side.
    pub fn with_named_process(mut self, name: impl Into<String>, process: AppProcess) -> Self {
        self.processes.push(NamedProcess {
            name: name.into(),
            process,
        });
        self
    }

    /// Adds a closer to the runner.
    ///
    /// Closers are executed after all app processes have stopped,
    /// regardless of whether they stopped due to error or cancellation.
    /// All closers will attempt to execute even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for executing closers. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets how long cancelled processes get to finish before they are aborted.
    /// Default is 5 seconds.
    pub fn with_process_grace(mut self, grace: Duration) -> Self {
        self.process_grace = grace;
        self
    }

    /// Sets a custom cancellation token, allowing external control over
    /// process cancellation.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all app processes and waits for completion or a shutdown signal.
    ///
    /// This method:
    /// 1. Installs SIGTERM/SIGINT handlers that cancel the shared token
    /// 2. Spawns all app processes concurrently
    /// 3. Cancels everything when a signal arrives or any process fails
    /// 4. Executes all closers with the configured timeout
    /// 5. Exits the application, code 1 if any process failed
    pub async fn run(self) {
        let ctrl_c_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    ctrl_c_token.cancel();
                }
                Err(err) => {
                    error!("Error setting up signal handler: {}", err);
                }
            }
        });

        #[cfg(unix)]
        {
            let sigterm_token = self.cancellation_token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        info!("Received SIGTERM signal");
                        sigterm_token.cancel();
                    }
                    Err(err) => {
                        error!("Error setting up SIGTERM handler: {}", err);
                    }
                }
            });
        }

        match self.execute().await {
            Some(err) => {
                error!("Application exiting with error: {:#}", err);
                std::process::exit(1);
            }
            None => {
                info!("Application exiting normally");
                std::process::exit(0);
            }
        }
    }

    /// Drives the processes to completion and returns the first process error.
    ///
    /// Split out from [`Runner::run`] so shutdown ordering stays observable
    /// without exiting the test process.
    async fn execute(self) -> Option<anyhow::Error> {
        let Runner {
            processes,
            closers,
            closer_timeout,
            process_grace,
            cancellation_token: token,
        } = self;

        let mut join_set: JoinSet<(String, Result<(), anyhow::Error>)> = JoinSet::new();
        for NamedProcess { name, process } in processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        // First phase: wait until every process finished on its own, or
        // something (a signal, a process failure) cancelled the token.
        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "App process completed");
                }
                Ok((name, Err(err))) => {
                    if !token.is_cancelled() {
                        error!(process = %name, "App process error: {:#}", err);
                        first_error = Some(err);
                        token.cancel();
                    }
                }
                Err(err) => {
                    if !token.is_cancelled() {
                        error!("App process panicked: {}", err);
                        first_error = Some(anyhow::anyhow!("App process panicked: {}", err));
                        token.cancel();
                    }
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        // Second phase: the remaining processes get a bounded window to
        // observe the cancel before they are aborted outright.
        let drained = tokio::time::timeout(process_grace, async {
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((name, Ok(()))) => debug!(process = %name, "App process completed"),
                    Ok((name, Err(err))) => {
                        debug!(process = %name, "App process error during shutdown: {:#}", err)
                    }
                    Err(err) => debug!("App process panicked during shutdown: {}", err),
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!("App processes still running after {:?}, aborting", process_grace);
        }
        join_set.shutdown().await;

        if !closers.is_empty() {
            info!("Running closers with timeout of {:?}", closer_timeout);
            match tokio::time::timeout(closer_timeout, run_closers(closers)).await {
                Ok(()) => info!("All closers completed"),
                Err(_) => error!("Closers timed out after {:?}", closer_timeout),
            }
        }

        first_error
    }
}

/// Runs all closers concurrently and logs their outcomes.
async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("Closer completed"),
            Ok(Err(err)) => error!("Closer error: {:#}", err),
            Err(err) => error!("Closer panicked: {}", err),
        }
    }
}
