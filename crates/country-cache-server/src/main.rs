//! Country Cache Server
//!
//! Fetches country metadata and USD exchange rates from two external APIs,
//! merges them into per-country GDP estimates, caches the result in an
//! embedded SQLite store, and serves it over HTTP.

mod handlers;
mod services;
mod storage;
mod summary;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use country_cache_core::{CountryApi, RatesApi, UpstreamPolicy};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use services::RefreshPipeline;
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub pipeline: Arc<RefreshPipeline>,
    pub image_path: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "Starting Country Cache Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    // Initialize SQLite database
    let db = Arc::new(
        Database::new(&config.database_path, config.max_db_connections)
            .await
            .context("Failed to initialize database")?,
    );
    info!("SQLite database initialized at: {}", config.database_path);

    // Refresh pipeline wiring
    let image_path = config.data_dir.join("summary.svg");
    let pipeline = Arc::new(RefreshPipeline::new(
        CountryApi::new().with_url(config.countries_url.clone()),
        RatesApi::new().with_url(config.rates_url.clone()),
        db.clone(),
        config.on_upstream_error,
        image_path.clone(),
    ));

    let state = AppState {
        db,
        pipeline,
        image_path,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/countries/refresh", post(handlers::countries::refresh))
        .route("/countries", get(handlers::countries::list))
        // Static segment takes priority over the :name capture below
        .route("/countries/image", get(handlers::countries::image))
        .route(
            "/countries/:name",
            get(handlers::countries::get).delete(handlers::countries::delete),
        )
        .route("/status", get(handlers::status::status))
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    data_dir: PathBuf,
    database_path: String,
    countries_url: String,
    rates_url: String,
    on_upstream_error: UpstreamPolicy,
    max_db_connections: u32,
}

async fn load_config() -> Result<Config> {
    // Data directory holds the database and the rendered summary image
    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        data_dir
            .join("country_cache.db")
            .to_string_lossy()
            .to_string()
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let countries_url = std::env::var("COUNTRIES_API_URL").unwrap_or_else(|_| {
        "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies"
            .to_string()
    });

    let rates_url = std::env::var("RATES_API_URL")
        .unwrap_or_else(|_| "https://api.exchangerate-api.com/v4/latest/USD".to_string());

    let on_upstream_error = match std::env::var("ON_UPSTREAM_ERROR") {
        Ok(value) => value
            .parse::<UpstreamPolicy>()
            .map_err(|e| anyhow::anyhow!("Invalid ON_UPSTREAM_ERROR: {e}"))?,
        Err(_) => UpstreamPolicy::default(),
    };

    let max_db_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10);

    Ok(Config {
        bind_address,
        data_dir,
        database_path,
        countries_url,
        rates_url,
        on_upstream_error,
        max_db_connections,
    })
}
