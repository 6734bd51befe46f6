//! Hazard route server - hazard reports and route safety evaluation over HTTP

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hazard_server::{api, config::Config, persistence, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hazard_server=debug".parse()?)
                .add_directive("hazard_core=debug".parse()?),
        )
        .init();

    tracing::info!("Starting hazard route server...");

    let config = Config::from_env();
    let port = config.server_port;

    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await?;
    let state = Arc::new(AppState::new(db, config));
    state.load_from_database().await?;

    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
