use crate::config;
use crate::server::{self, AppState};

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting data catalog API in {:?} mode", config.environment);
    if crate::is_development!() && config.security.jwt_secret == "development-only-secret" {
        tracing::warn!("Using the built-in development JWT secret; set JWT_SECRET_KEY outside local use");
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET_KEY must be set in {:?} mode", config.environment);
    }

    let state = AppState::initialize(config).await?;
    server::serve(state, port.unwrap_or(config.api.port)).await
}
