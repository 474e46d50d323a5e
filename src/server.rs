//! HTTP server initialization and runtime setup.
//!
//! Builds the in-process components, spawns the click worker and maintenance
//! tasks, and runs the Axum server until a shutdown signal arrives.

use crate::application::services::{CodeAllocator, LinkService};
use crate::config::Config;
use crate::domain::click_event::{ClickEvent, ClickSender};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::ShortUrlCache;
use crate::infrastructure::maintenance::{
    spawn_cache_sweep, spawn_link_purge, spawn_rate_limit_cleanup,
};
use crate::infrastructure::persistence::InMemoryLinkRepository;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Wires the shared state from `config` around `repository`.
///
/// Returns the state together with the receiving end of the click queue,
/// which the caller hands to [`run_click_worker`].
pub fn build_state(
    config: &Config,
    repository: Arc<dyn LinkRepository>,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let cache = Arc::new(ShortUrlCache::new(
        config.cache_max_entries,
        config.cache_ttl(),
    ));
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        config.rate_limit_window(),
    ));

    let allocator = CodeAllocator::new(
        repository.clone(),
        config.code_length,
        config.code_max_attempts,
    );
    let link_service = Arc::new(LinkService::new(
        repository,
        allocator,
        cache.clone(),
        config.base_url.clone(),
    ));

    let (click_sender, click_rx) = ClickSender::channel(config.click_queue_capacity);

    let state = AppState {
        link_service,
        cache,
        rate_limiter,
        click_sender,
        rate_limit_excluded: Arc::new(
            config
                .rate_limit_excluded_paths
                .iter()
                .cloned()
                .collect::<HashSet<_>>(),
        ),
        behind_proxy: config.behind_proxy,
    };

    (state, click_rx)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - In-memory link repository
/// - Short URL cache and rate limiter
/// - Background click worker
/// - Cache sweep, rate limit cleanup and expired link purge tasks
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The listen address is invalid
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository: Arc<dyn LinkRepository> = Arc::new(InMemoryLinkRepository::new());
    info!("Using in-memory link repository");

    let (state, click_rx) = build_state(&config, repository.clone());

    let worker = tokio::spawn(run_click_worker(click_rx, repository));

    let background = vec![
        spawn_cache_sweep(state.cache.clone(), config.cache_sweep_interval()),
        spawn_rate_limit_cleanup(
            state.rate_limiter.clone(),
            config.rate_limit_cleanup_interval(),
        ),
        spawn_link_purge(state.link_service.clone(), config.link_purge_interval()),
    ];

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal(background))
    .await?;

    // The router and its click sender are dropped once serve returns, so the
    // worker drains what is queued and exits.
    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Click worker ended abnormally: {}", e),
        Err(_) => warn!("Click worker did not drain within {:?}", WORKER_DRAIN_TIMEOUT),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the maintenance tasks.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }

    for handle in background {
        handle.abort();
    }
    warn!("Maintenance tasks aborted");
}
