use homevault_proxy::{AppState, GatewayClient, ProxyConfig, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ProxyConfig::from_env()?;
    if config.api_key.is_none() {
        tracing::warn!("AI_GATEWAY_API_KEY is not set, requests will fail");
    }

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        gateway = %config.gateway_url,
        "homevault proxy listening"
    );
    axum::serve(listener, router(AppState::new(GatewayClient::from_config(&config)))).await?;
    Ok(())
}
