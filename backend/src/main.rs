use tracing::info;
use tracing_subscriber::EnvFilter;

use scheduler_backend::config::{self, Config};
use scheduler_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting cleaning scheduler with {:?}", config);

    let state = initialize_backend(&config)?;
    let app = create_router(state, &config.cors_origin)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
