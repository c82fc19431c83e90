use std::sync::Arc;

use estoque_api::app::services::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    estoque_observability::init();

    let services = Arc::new(AppServices::from_env().await?);
    let app = estoque_api::app::build_app(services);

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
