//! Quicklook analysis service for astronomical images.
//!
//! Fetches FITS frames from object storage and serves derived
//! quantities over HTTP: intensity profiles along a line segment,
//! region statistics, and clipped histograms.

mod analysis;
mod config;
mod error;
mod fits;
mod handlers;
mod render;
mod storage;

use analysis::coords::CoordinateMapper;
use axum::routing::{get, post};
use axum::Router;
use config::Config;
use handlers::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use storage::client::ObjectStoreClient;
use storage::loader::ImageLoader;
use tower_http::trace::TraceLayer;
use tracing::info;

fn main() -> Result<(), error::AppError> {
    tracing_subscriber::fmt()
        .with_env_filter("quicklook_analysis=info,tower_http=debug")
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .map_err(|e| error::AppError::Internal(format!("Failed to build runtime: {e}")))?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), error::AppError> {
    let config = Config::from_env();
    info!("Starting quicklook analysis service");
    info!("Store URL: {}", config.store_url);
    info!("Bucket: {}, prefix: {}", config.bucket, config.data_prefix);
    info!(
        "Image cache: ttl {}s, {} entries max",
        config.cache_ttl_secs, config.cache_max_entries
    );
    info!("Axis origin: {:?}", config.orientation);

    // The loader is the single shared collaborator; handlers receive it
    // by handle so the analysis core stays free of process-wide state.
    let store = ObjectStoreClient::new(
        config.store_url.clone(),
        config.bucket.clone(),
        config.data_prefix.clone(),
    );
    let loader = ImageLoader::new(
        store,
        Duration::from_secs(config.cache_ttl_secs),
        config.cache_max_entries,
    );
    let state = Arc::new(AppState {
        loader,
        mapper: CoordinateMapper::new(config.orientation),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/profile", post(handlers::profile::intensity_profile))
        .route("/stats", post(handlers::stats::region_stats))
        .route("/histogram", post(handlers::histogram::histogram))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
