//! hostdash_agent: serves host metrics as cached JSON for the dashboard.

use hostdash_agent::config::AgentConfig;
use hostdash_agent::http::router;
use hostdash_agent::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if std::env::args().any(|a| a == "-h" || a == "--help") {
        println!("Usage: hostdash_agent [--port PORT|-p PORT]");
        return Ok(());
    }

    let config = AgentConfig::load();
    let addr = config.socket_addr();
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("hostdash agent listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
