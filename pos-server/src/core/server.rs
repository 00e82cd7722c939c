//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::net::SocketAddr;
use std::time::Duration;

use crate::core::{Config, Result, ServerError, ServerState};
use crate::services::https::build_router;

/// HTTP Server
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 启动服务，直到收到 Ctrl+C
    pub async fn run(&self) -> Result<()> {
        let state = ServerState::initialize(&self.config).await?;

        let tasks = state.start_background_tasks();
        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("🚀 POS server listening on http://{}", addr);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        let grace = Duration::from_millis(self.config.shutdown_timeout_ms);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        let served = axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await;

        tasks.shutdown(grace).await;
        state.pool.close().await;

        served.map_err(ServerError::Io)
    }
}
