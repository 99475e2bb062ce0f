use clap::Parser;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventsink::auth::ApiKey;
use eventsink::routes::{self, AppState};
use eventsink::storage::FileSystemStorage;

#[derive(Parser, Debug)]
#[command(name = "eventsink", about = "Self-hosted webhook event sink")]
struct Config {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8184")]
    listen_addr: String,

    /// Directory to store event JSON files
    #[arg(long, env = "DATA_DIR", default_value = "./data/events")]
    data_dir: PathBuf,

    /// API key clients must present on the event routes
    #[arg(long, env = "API_KEY")]
    api_key: String,

    /// Maximum event payload size in megabytes
    #[arg(long, env = "MAX_BODY_MB", default_value = "5")]
    max_body_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventsink=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    tracing::info!(
        listen = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        max_body_mb = config.max_body_mb,
        "Starting eventsink server"
    );

    let storage = FileSystemStorage::new(&config.data_dir).await?;

    let state = AppState { storage };
    let api_key = ApiKey(config.api_key.clone());
    let body_limit = config.max_body_mb * 1024 * 1024;

    let app = routes::app(state, api_key, body_limit)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
