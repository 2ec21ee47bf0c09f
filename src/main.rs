use tracing::info;
use tracing_subscriber::EnvFilter;

use review_serve::config::ServeConfig;
use review_serve::error::Result;
use review_serve::registry::{ModelKind, ModelRegistry};
use review_serve::server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServeConfig::from_env()?;
    info!(
        addr = %config.addr,
        models_dir = %config.models_dir.display(),
        "starting review-serve"
    );

    let device = config.device.resolve()?;
    let registry = ModelRegistry::load(&config, &device);
    let ready = ModelKind::ALL
        .iter()
        .filter(|kind| registry.is_available(**kind))
        .count();
    info!(ready, total = ModelKind::ALL.len(), "registry initialized");

    let app = create_router(AppState::new(registry));
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
