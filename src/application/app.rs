use crate::config::Settings;
use crate::proxy::EdgeService;
use crate::Result;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    service: EdgeService,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        Self::with_settings(Settings::new()?)
    }

    pub fn with_settings(settings: Settings) -> Result<Self> {
        let service = EdgeService::new(settings.edge_config()?)?;
        Ok(Self { settings, service })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let address = self.settings.bind_address();
        let listener = TcpListener::bind(&address).await?;

        info!(
            address = %address,
            environment = %self.settings.application.environment,
            upstream = %self.settings.upstream.base_url,
            regions = ?self.settings.deployment.regions,
            cache_ttl_secs = self.settings.cache.ttl_secs,
            "Starting edge router"
        );

        axum::serve(listener, self.service.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Edge router stopped");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(error) => warn!(%error, "Failed to listen for shutdown signal"),
    }
}
