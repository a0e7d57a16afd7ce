pub mod handler;

use crate::client::providers::{SearchContext, SourceProvider};
use crate::repositories::{CacheRepository, Repository};
use crate::resilience::TimeoutExt;
use crate::{AppContext, Config, Error, Result};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use handler::ResearchServerHandler;

/// MCP server on stdio with signal-driven shutdown
pub struct Server {
    context: Arc<AppContext>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!("Starting MCP server infrastructure");

        let handler = ResearchServerHandler::new(&self.context);
        info!("MCP server handler initialized successfully");

        let context = self.context.clone();
        tokio::spawn(async move {
            upstream_health(&context).await;
        });

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown_token.cancel();
        });

        info!("Starting MCP server on stdio transport");

        let server_result = tokio::select! {
            result = Self::run_mcp_server(handler) => result,
            () = self.cancellation_token.cancelled() => {
                info!("Shutdown signal received, stopping MCP server");
                Ok(())
            }
        };

        let shutdown_timeout =
            Duration::from_secs(self.config().server.graceful_shutdown_timeout_secs);
        if self
            .graceful_shutdown()
            .with_timeout_duration(shutdown_timeout)
            .await
            .is_err()
        {
            warn!("Graceful shutdown timeout exceeded, forcing shutdown");
        }

        info!("MCP server shutdown complete");
        server_result
    }

    /// Probe the arXiv API once and log whether it answered
    pub async fn check_upstream(&self) -> bool {
        upstream_health(&self.context).await
    }

    async fn run_mcp_server(handler: ResearchServerHandler) -> Result<()> {
        info!("Connecting MCP server to stdio transport");

        let server = handler
            .serve(stdio())
            .await
            .map_err(|e| Error::Service(format!("Failed to start MCP server: {e}")))?;

        let quit_reason = server
            .waiting()
            .await
            .map_err(|e| Error::Service(format!("MCP server error: {e}")))?;

        info!("MCP server completed with reason: {:?}", quit_reason);
        Ok(())
    }

    async fn graceful_shutdown(&self) {
        let summaries = self.context.summarizer.cache();
        let content = self.context.retriever.cache();
        let searches = self.context.search_tool.cache();

        for (name, entries, stats) in [
            (summaries.name(), summaries.len().await, summaries.cache_stats().await),
            (content.name(), content.len().await, content.cache_stats().await),
            (searches.name(), searches.len().await, searches.cache_stats().await),
        ] {
            info!(
                "{} cache at shutdown: {} entries, {} hits, {} misses ({:.1}% hit rate)",
                name,
                entries,
                stats.hits,
                stats.misses,
                stats.hit_rate()
            );
        }
    }

    pub fn shutdown(&self) {
        warn!("Initiating server shutdown");
        self.cancellation_token.cancel();
    }

    /// Check if the server has been requested to shutdown
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Get the server configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.context.config
    }
}

async fn upstream_health(context: &AppContext) -> bool {
    let provider = &context.provider;
    let search_context = SearchContext::with_timeout(context.config.arxiv.search_timeout());

    match provider.health_check(&search_context).await {
        Ok(true) => {
            info!("{} provider is reachable", provider.name());
            true
        }
        Ok(false) => {
            warn!("{} provider health check failed, search may be unavailable", provider.name());
            false
        }
        Err(e) => {
            warn!("{} provider health check errored: {}", provider.name(), e);
            false
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                _ = tokio::signal::ctrl_c() => info!("Received SIGINT, initiating graceful shutdown"),
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT, initiating graceful shutdown");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl-C, initiating graceful shutdown");
    }
}
