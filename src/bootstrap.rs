use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::{
    api::handler::AppState,
    chain::{ChainConfig, HttpLedgerClient, LedgerSdk},
    config::Config,
    error::AppResult,
    notify::{Notifier, NullNotifier, TelegramNotifier},
    relay::{HttpSignRelay, SignRelay},
    settlement::{SettlementConfig, SettlementWorker},
    store::PgStore,
    swap::{SwapConfig, SwapService, SwapStore},
};

pub struct AppComponents {
    pub state: AppState,
    pub worker: SettlementWorker,
}

/// Construct every component once and wire them together. All collaborator
/// clients are owned here and injected; nothing reaches for a global.
pub async fn initialize_app_state(config: &Config) -> AppResult<AppComponents> {
    info!("initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;
    let pg_store = PgStore::new(pool);
    pg_store.migrate().await?;
    info!("✅ durable store ready");

    let store = SwapStore::new(Arc::new(pg_store));

    let relay: Arc<dyn SignRelay> = Arc::new(HttpSignRelay::new(config.relay_url.clone()));
    let ledger: Arc<dyn LedgerSdk> = Arc::new(HttpLedgerClient::new(ChainConfig {
        chain_id: config.chain_id.clone(),
        rest_url: config.chain_rest_url.clone(),
        denom: config.token_denom.clone(),
        treasury_address: config.treasury_address.clone(),
    }));
    info!("✅ ledger client ready for chain {}", config.chain_id);

    let notifier: Arc<dyn Notifier> =
        match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                info!("✅ telegram notifier enabled");
                Arc::new(TelegramNotifier::new(token.clone(), chat_id.clone()))
            }
            _ => {
                warn!("⚠️  BOT_TOKEN/CHAT_ID not set - notifications disabled");
                Arc::new(NullNotifier)
            }
        };

    let service = Arc::new(SwapService::new(
        store.clone(),
        relay,
        ledger.clone(),
        SwapConfig::from(config),
    ));

    let worker = SettlementWorker::new(store, ledger, notifier, SettlementConfig::from(config));

    Ok(AppComponents {
        state: AppState { service },
        worker,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}
