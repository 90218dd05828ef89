use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {name} is not a valid number: {value}")]
    NotNumeric { name: &'static str, value: String },

    #[error("environment variable {name} must be greater than zero")]
    NotPositive { name: &'static str },
}

/// Runtime configuration, loaded and validated once at startup and passed
/// into each component at construction. Variable names follow the deployed
/// service's environment contract.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,

    // Relay / signing app
    pub relay_url: String,
    pub project_secret_key: String,
    pub station_identity: String,
    pub login_message: String,
    pub swap_message: String,

    // Source ledger
    pub chain_id: String,
    pub chain_rest_url: String,
    pub token_denom: String,
    pub token_symbol: String,
    pub explorer_host: String,

    // Treasury
    pub treasury_address: String,
    pub treasury_key_cipher: String,
    pub shared_secret: String,

    // Swap program
    pub request_expire_seconds: u64,
    pub swap_rate: u64,
    pub worker_poll_seconds: u64,
    pub swap_event_expired: bool,

    // Notifications (optional; notifier is a no-op when unset)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: required("DATABASE_URL")?,

            relay_url: required("RELAY")?,
            project_secret_key: required("PROJECT_SECRET_KEY")?,
            station_identity: required("STATION_IDENTITY")?,
            login_message: std::env::var("LOGIN_MESSAGE")
                .unwrap_or_else(|_| "Login".to_string()),
            swap_message: std::env::var("SWAP_MESSAGE")
                .unwrap_or_else(|_| "Swap".to_string()),

            chain_id: required("CHAIN_ID")?,
            chain_rest_url: required("CHAIN_REST_URL")?,
            token_denom: required("TOKEN_DENOM")?,
            token_symbol: required("TOKEN_SYMBOL")?,
            explorer_host: required("EXPLORER_HOST")?,

            treasury_address: required("SWAP_WALLET_ADDRESS")?,
            treasury_key_cipher: required("SWAP_WALLET_KEY")?,
            shared_secret: required("SECRET")?,

            request_expire_seconds: required_positive("REQUEST_EXPIRE_SECOND")?,
            swap_rate: required_positive("SWAP_RATE")?,
            worker_poll_seconds: parse_positive("WORKER_POLL_SECOND", 3)?,
            swap_event_expired: std::env::var("EXPIRED_EVENT")
                .map(|v| v == "true")
                .unwrap_or(false),

            telegram_bot_token: std::env::var("BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("CHAT_ID").ok(),
        })
    }

    pub fn request_ttl(&self) -> Duration {
        Duration::from_secs(self.request_expire_seconds)
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_secs(self.worker_poll_seconds)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn required_positive(name: &'static str) -> Result<u64, ConfigError> {
    let value = required(name)?;
    let parsed = value
        .parse::<u64>()
        .map_err(|_| ConfigError::NotNumeric { name, value })?;
    if parsed == 0 {
        return Err(ConfigError::NotPositive { name });
    }
    Ok(parsed)
}

fn parse_positive(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = value
                .parse::<u64>()
                .map_err(|_| ConfigError::NotNumeric { name, value })?;
            if parsed == 0 {
                return Err(ConfigError::NotPositive { name });
            }
            Ok(parsed)
        }
        _ => Ok(default),
    }
}
