use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

use crate::api::handler::{
    callback, get_status, get_token_data, health_check, sign_login, sign_swap, verify, AppState,
};

pub async fn create_app(state: AppState) -> Router {
    info!("⚙️ setting up HTTP routes...");

    Router::new()
        .route("/health", get(health_check))
        .route("/swap/token", get(get_token_data))
        .route("/swap/requests/:request_key", get(get_status))
        .route("/swap/sign/login", post(sign_login))
        .route("/swap/sign/swap", post(sign_swap))
        .route("/swap/callback", post(callback))
        .route("/swap/verify", post(verify))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn run_server(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 listening on {bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
