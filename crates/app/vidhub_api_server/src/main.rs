//! Vidhub API server binary.
//!
//! Serves the user/session API over the bundled in-memory document store and
//! a local-directory media store.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use vidhub_api::config::ApiConfig;
use vidhub_core::media::LocalMediaStore;
use vidhub_core::store::memory::MemoryStore;

/// CLI arguments for the API server. Unset values fall back to the
/// environment (see `ApiConfig::from_env`).
#[derive(Parser, Debug)]
#[command(name = "vidhub_api_server", about = "Vidhub API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Host to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Allow auth cookies over plain HTTP (local development only).
    #[arg(long, default_value_t = false)]
    insecure_cookies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,vidhub_api=debug,vidhub_core=debug")
                }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = format!("{}:{}", args.host, args.port);
    if args.insecure_cookies {
        config.cookie_secure = false;
    }

    info!(
        bind_addr = %config.bind_addr,
        media_dir = %config.media_dir.display(),
        access_ttl_secs = config.tokens.access_ttl.num_seconds(),
        refresh_ttl_secs = config.tokens.refresh_ttl.num_seconds(),
        "starting vidhub_api_server"
    );

    let state = vidhub_api::AppState {
        store: Arc::new(MemoryStore::with_user_indexes()),
        media: Arc::new(LocalMediaStore::new(
            config.media_dir.clone(),
            config.media_base_url.clone(),
        )),
        config: config.clone(),
    };

    let app = vidhub_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
