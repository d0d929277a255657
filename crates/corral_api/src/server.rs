use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// HTTP process serving the query routes and the WebSocket stream.
pub struct ApiServer {
    bind_addr: String,
    router: Router,
}

impl ApiServer {
    pub fn new(bind_addr: impl Into<String>, router: Router) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            router,
        }
    }

    /// Bind and serve until the cancellation token fires.
    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {}", self.bind_addr))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read HTTP listener address")?;
        info!(addr = %local_addr, "API server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(cancellation_token.cancelled_owned())
            .await
            .context("API server failed")?;

        info!("API server stopped");
        Ok(())
    }
}
