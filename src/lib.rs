pub mod access_control;
pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod error;
pub mod medical_record;
pub mod models;
pub mod numbering;
pub mod registration;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load configuration, open the database, seed the administrator, and serve
/// until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_filter);

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    tracing::debug!(?config, "Configuration loaded");

    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::open(config)?);
    {
        let conn = core.conn().await?;
        core.seed_default_admin(&conn)?;
    }

    let server = api::start_api_server_on(core.clone(), bind_addr).await?;
    tracing::info!(
        addr = %server.session.server_addr,
        session_id = %server.session.session_id,
        "Listening"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }

    server.stop().await;
    core.pool.close();
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
