//! Stage scoring backend binary entrypoint wiring REST, SSE and the record store.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use stage_scoring_back::dao::record_store::couchdb::{CouchConfig, CouchRecordStore};
#[cfg(feature = "mongo-store")]
use stage_scoring_back::dao::record_store::mongodb::{MongoConfig, MongoRecordStore};
use stage_scoring_back::{
    config::AppConfig,
    dao::{
        record_store::{RecordStore, memory::MemoryRecordStore},
        storage::StorageError,
    },
    routes,
    services::{sse_service, storage_supervisor},
    state::{AppState, SharedState},
};

/// Record store implementations selectable through `STORE_BACKEND`.
#[derive(Debug, Clone)]
enum StoreBackend {
    Memory { snapshot: Option<PathBuf> },
    #[cfg(feature = "couch-store")]
    Couch,
    #[cfg(feature = "mongo-store")]
    Mongo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = store_backend_from_env()?;
    info!(?backend, "selected record store backend");

    let app_state = AppState::new(config);

    tokio::spawn(sse_service::forward_system_status(app_state.clone()));
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        let backend = backend.clone();
        async move { connect_store(backend).await }
    }));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn store_backend_from_env() -> anyhow::Result<StoreBackend> {
    let name = env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".into());
    match name.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StoreBackend::Memory {
            snapshot: env::var_os("SNAPSHOT_PATH").map(PathBuf::from),
        }),
        #[cfg(feature = "couch-store")]
        "couch" | "couchdb" => Ok(StoreBackend::Couch),
        #[cfg(feature = "mongo-store")]
        "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
        other => bail!("unsupported STORE_BACKEND `{other}`"),
    }
}

/// Open a fresh connection to the selected record store.
async fn connect_store(backend: StoreBackend) -> Result<Arc<dyn RecordStore>, StorageError> {
    match backend {
        StoreBackend::Memory { snapshot: None } => {
            warn!("no SNAPSHOT_PATH set; serving an empty in-memory competition");
            Ok(Arc::new(MemoryRecordStore::default()))
        }
        StoreBackend::Memory {
            snapshot: Some(path),
        } => Ok(Arc::new(MemoryRecordStore::from_json_file(&path)?)),
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            let config = CouchConfig::from_env()?;
            Ok(Arc::new(CouchRecordStore::connect(config).await?))
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            let config = MongoConfig::from_env().await?;
            Ok(Arc::new(MongoRecordStore::connect(config).await?))
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
