use alphalend_report::api::{create_router, ApiState};
use alphalend_report::{telemetry, AlphalendClient, ReportConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing("info");

    let config = ReportConfig::from_env()?;
    let client = Arc::new(AlphalendClient::from_config(&config)?);
    let app = create_router(ApiState::new(client));

    let listener = tokio::net::TcpListener::bind(config.api_addr.as_str()).await?;
    tracing::info!(addr = %config.api_addr, "tBTC API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
