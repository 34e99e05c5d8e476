use anyhow::Result;
use edge_router::application::telemetry::init_tracing;
use edge_router::config::Settings;
use edge_router::Application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings.logging);

    info!("Starting edge router application");

    let app = Application::with_settings(settings)?;
    app.run().await?;

    Ok(())
}
