//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but request-level
//! errors use `kernel::error::AppError`.
//!
//! `api hash-password` prints an Argon2id hash for `ADMIN_PASSWORD` instead
//! of starting the server.

mod cli;
mod config;
mod jobs;

use auth::{AuthAppState, FileSessionStore, auth_router, protect};
use axum::Router;
use catalog::application::import::ImportFeedUseCase;
use catalog::{
    CatalogAppState, FeedClient, KvStore, MemoryStore, RedisStore, admin_router, catalog_router,
};
use config::ApiConfig;
use kernel::error::app_error::AppError;
use platform::clock::{Clock, SystemClock};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some(cli::HASH_PASSWORD) {
        return cli::hash_password(std::io::stdin().lock(), std::io::stdout().lock());
    }

    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,catalog=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store, nothing survives a restart");
        let store = MemoryStore::new(clock.clone());
        serve(Arc::new(store), config, clock).await
    } else {
        let store = RedisStore::connect(&config.store_url).await?;
        tracing::info!("Connected to store");
        serve(Arc::new(store), config, clock).await
    }
}

async fn serve<S>(store: Arc<S>, config: ApiConfig, clock: Arc<dyn Clock>) -> anyhow::Result<()>
where
    S: KvStore + Send + Sync + 'static,
{
    // Moderator sessions
    let sessions = Arc::new(FileSessionStore::open(&config.session_file).await?);
    let auth_state = AuthAppState::new(sessions, config.auth.clone(), clock.clone());

    // A session file that cannot be written stops startup
    let removed = auth_state.sessions.purge_expired().await?;
    tracing::info!(sessions_deleted = removed, "Session cleanup completed");

    let catalog_state = CatalogAppState::new(store.clone(), config.catalog.clone(), clock)
        .with_login_lockout(auth_state.lockout.clone());
    let mut fatal = auth_state.sessions.fatal_signal();

    // Background jobs
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut jobs = vec![jobs::spawn_barcode_count_refresh(
        catalog_state.telemetry(),
        config.barcode_count_refresh,
        shutdown_rx.clone(),
    )];

    match &config.feed {
        Some(feed) => {
            let client = Arc::new(FeedClient::new(&feed.url, &feed.api_key)?);
            let import = ImportFeedUseCase::new(store, client, catalog_state.config.clone());
            jobs.push(jobs::spawn_feed_import(
                import,
                config.feed_import_interval,
                shutdown_rx,
            ));
        }
        None => tracing::info!("No product feed configured, import disabled"),
    }

    let app = Router::new()
        .merge(catalog_router(catalog_state.clone()))
        .merge(auth_router(auth_state.clone()))
        .nest("/admin", protect(admin_router(catalog_state), auth_state))
        .fallback(|| async { AppError::not_found("No such endpoint") })
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_tx, fatal.clone()))
    .await?;

    for job in jobs {
        if let Err(e) = job.await {
            tracing::warn!(error = %e, "Background job ended abnormally");
        }
    }

    if *fatal.borrow_and_update() {
        anyhow::bail!("Session mapping could not be persisted, server stopped");
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C, SIGTERM or a fatal session store failure, then tell
/// the background jobs to stop
async fn shutdown_signal(jobs: watch::Sender<bool>, mut fatal: watch::Receiver<bool>) {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let session_failure = async {
        if fatal.wait_for(|failed| *failed).await.is_ok() {
            tracing::error!("Session store failed, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = session_failure => {},
    }

    // Receivers may already be gone
    let _ = jobs.send(true);
}
