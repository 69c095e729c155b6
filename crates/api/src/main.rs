use anyhow::Context;

use repdesk_infra::StoreConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    repdesk_observability::init();

    let config = StoreConfig::from_env();
    let services = repdesk_api::app::services::build_services(&config)
        .await
        .context("failed to initialize services")?;
    let app = repdesk_api::app::build_app(services);

    let bind = std::env::var("REPDESK_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
