mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use lumen_api::auth::{AppState, AppStateInner};
use lumen_api::explain::ExplainClient;
use lumen_db::{Database, Store};
use lumen_types::models::Verse;

use crate::config::{Config, CorsOrigins};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen=debug,lumen_api=debug,lumen_db=info,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e:#}");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    let db: Arc<dyn Store> = Arc::new(Database::open(&config.database_path)?);
    if let Some(path) = &config.verses_path {
        seed_verses(db.as_ref(), path)?;
    }
    if config.explain.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; /api/niv/explain will fail");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
        explainer: ExplainClient::new(config.explain.clone())?,
    });

    let app = lumen_api::router(state)
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Lumen server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Import the verse file when the table is still empty.
fn seed_verses(db: &dyn Store, path: &Path) -> anyhow::Result<()> {
    let existing = db.count_verses()?;
    if existing > 0 {
        info!("Verse table already holds {} rows, skipping import", existing);
        return Ok(());
    }
    let raw = std::fs::read_to_string(path)?;
    let verses: Vec<Verse> = serde_json::from_str(&raw)?;
    let inserted = db.import_verses(&verses)?;
    info!("Imported {} verses from {}", inserted, path.display());
    Ok(())
}

fn cors_layer(origins: &CorsOrigins) -> anyhow::Result<CorsLayer> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    let headers = [AUTHORIZATION, CONTENT_TYPE, ACCEPT, ORIGIN];

    let layer = match origins {
        // Browsers refuse a wildcard origin with credentials.
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_credentials(false),
        CorsOrigins::List(list) => {
            let values = list
                .iter()
                .map(|o| HeaderValue::from_str(o))
                .collect::<Result<Vec<_>, _>>()?;
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_credentials(true)
        }
    };
    Ok(layer.allow_methods(methods).allow_headers(headers))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
