mod api;
mod bootstrap;
mod chain;
mod config;
mod crypto;
mod error;
mod notify;
mod relay;
mod server;
mod settlement;
mod store;
mod swap;
#[cfg(test)]
mod testing;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,swap_backend=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 starting token swap backend");

    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let components = bootstrap::initialize_app_state(&config).await?;

    // The settlement worker runs for the lifetime of the process; the watch
    // channel is its only stop signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = components.worker;
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let app = server::create_app(components.state).await;
    server::run_server(app, &config.bind_address).await?;

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    info!("shutdown complete");
    Ok(())
}
