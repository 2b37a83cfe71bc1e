use anyhow::Context;
use dotenv::dotenv;
use std::env;
use std::net::Ipv4Addr;
use std::sync::Arc;
use taskboard::{SharedData, app_env, db, logging, persistence, router};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url =
        env::var(app_env::DB_URL).unwrap_or_else(|_| "sqlite://taskboard.db".to_owned());
    let pool = db::connect(&db_url).await?;
    db::init_schema(&pool).await?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(pool),
    });
    let app = router(shared_data.clone());

    let port: u16 = env::var(app_env::SERVER_PORT)
        .ok()
        .and_then(|raw_port| raw_port.parse().ok())
        .unwrap_or(3001);
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("binding port {port}"))?;

    info!("Server running on http://localhost:{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving the API")?;

    shared_data.ext_cxn.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(signal_err) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for the shutdown signal: {signal_err}");
    }
}
