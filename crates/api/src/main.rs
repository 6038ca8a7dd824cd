use anyhow::Context;

use stockyard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockyard_observability::init();

    let config = AppConfig::from_env();
    let app = stockyard_api::app::build_app(&config).context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
