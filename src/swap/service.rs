use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::chain::{signer_pubkey_from_raw, to_minor_units, Coin, LedgerSdk, TransferMsg};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::relay::{SignRelay, SIGN_SCHEME};

use super::models::{
    LoginProof, RequestStatus, RequestType, SettlementQueueEntry, SignChallenge, SwapRequest,
    TokenData, VerifyOutcome,
};
use super::repository::SwapStore;

#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub project_secret_key: String,
    pub station_identity: String,
    pub login_message: String,
    pub swap_message: String,
    pub token_denom: String,
    pub token_symbol: String,
    pub treasury_address: String,
    pub request_ttl: Duration,
    pub swap_event_expired: bool,
}

impl From<&Config> for SwapConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            project_secret_key: cfg.project_secret_key.clone(),
            station_identity: cfg.station_identity.clone(),
            login_message: cfg.login_message.clone(),
            swap_message: cfg.swap_message.clone(),
            token_denom: cfg.token_denom.clone(),
            token_symbol: cfg.token_symbol.clone(),
            treasury_address: cfg.treasury_address.clone(),
            request_ttl: cfg.request_ttl(),
            swap_event_expired: cfg.swap_event_expired,
        }
    }
}

/// Sign-challenge orchestrator: creates requests, applies the callback state
/// transition and decides whether an accepted swap proceeds to settlement.
pub struct SwapService {
    store: SwapStore,
    relay: Arc<dyn SignRelay>,
    ledger: Arc<dyn LedgerSdk>,
    cfg: SwapConfig,
}

impl SwapService {
    pub fn new(
        store: SwapStore,
        relay: Arc<dyn SignRelay>,
        ledger: Arc<dyn LedgerSdk>,
        cfg: SwapConfig,
    ) -> Self {
        Self {
            store,
            relay,
            ledger,
            cfg,
        }
    }

    pub fn token_metadata(&self) -> TokenData {
        TokenData {
            denom: self.cfg.token_denom.clone(),
            symbol: self.cfg.token_symbol.clone(),
        }
    }

    pub async fn status(&self, request_key: &str) -> AppResult<SwapRequest> {
        self.store.request(request_key).await
    }

    /// Issue a login challenge: a fresh nonce to be signed in
    /// arbitrary-message mode.
    pub async fn begin_login(&self) -> AppResult<SignChallenge> {
        let nonce = Uuid::new_v4().to_string();

        let session = self.relay.connect(&self.cfg.project_secret_key).await?;
        let artifact = self
            .relay
            .arbitrary_sign_qr(&session, &nonce, &self.cfg.login_message)
            .await?;
        let request_key = self.request_key_of(&artifact)?;

        self.store
            .create_request(
                &request_key,
                RequestType::Login,
                &nonce,
                "",
                "",
                self.cfg.request_ttl,
            )
            .await?;

        info!("login challenge issued: {request_key}");
        Ok(SignChallenge {
            qrcode: self.station_artifact(&artifact),
            request_key,
        })
    }

    /// Issue a swap challenge: a transfer document moving `amount` major
    /// units from the signer to the treasury, to be signed directly.
    pub async fn begin_swap(&self, signer: &str, amount: u64) -> AppResult<SignChallenge> {
        if self.cfg.swap_event_expired {
            return Err(AppError::EventExpired);
        }

        let pubkey = self
            .store
            .pubkey(signer)
            .await?
            .ok_or_else(|| AppError::UnknownSigner(signer.to_string()))?;

        let minor_amount = to_minor_units(amount);
        let msg = TransferMsg {
            from_address: signer.to_string(),
            to_address: self.cfg.treasury_address.clone(),
            amount: vec![Coin {
                denom: self.cfg.token_denom.clone(),
                amount: minor_amount.to_string(),
            }],
        };

        let session = self.relay.connect(&self.cfg.project_secret_key).await?;
        let sign_doc = self.ledger.make_sign_doc(signer, &pubkey, &[msg]).await?;
        let argument = json!({
            "token": {
                "denom": self.cfg.token_denom,
                "symbol": self.cfg.token_symbol,
                "amount": minor_amount.to_string(),
            },
        });
        let artifact = self
            .relay
            .direct_sign_qr(&session, signer, &sign_doc, &self.cfg.swap_message, argument)
            .await?;
        let request_key = self.request_key_of(&artifact)?;

        self.store
            .create_request(
                &request_key,
                RequestType::Swap,
                &sign_doc,
                signer,
                "",
                self.cfg.request_ttl,
            )
            .await?;

        info!("swap challenge issued: {request_key} for {signer} ({amount} {})", self.cfg.token_symbol);
        Ok(SignChallenge {
            qrcode: self.station_artifact(&artifact),
            request_key,
        })
    }

    /// Apply the signing app's callback to a pending request.
    ///
    /// A rejection is terminal. An approval is processed per request type;
    /// any failure inside the approved branch is logged and swallowed — the
    /// transition is at-least-attempted, not atomic.
    pub async fn handle_callback(
        &self,
        request_key: &str,
        approved: bool,
        sign_data: serde_json::Value,
    ) -> AppResult<()> {
        let request = self.store.request(request_key).await?;
        if request.is_missing() {
            return Err(AppError::RequestNotFound);
        }

        if !approved {
            self.store
                .set_status(request_key, RequestStatus::Invalid)
                .await?;
            return Ok(());
        }

        let outcome = match request.request_type {
            Some(RequestType::Login) => {
                self.approved_login(request_key, &request, sign_data).await
            }
            Some(RequestType::Swap) => {
                self.approved_swap(request_key, &request, sign_data).await
            }
            None => Err(AppError::Collaborator(format!(
                "request {request_key} has no type"
            ))),
        };

        if let Err(e) = outcome {
            error!("callback processing failed for {request_key}: {e}");
        }
        Ok(())
    }

    async fn approved_login(
        &self,
        request_key: &str,
        request: &SwapRequest,
        sign_data: serde_json::Value,
    ) -> AppResult<()> {
        let proof: LoginProof = serde_json::from_value(sign_data)?;

        if !self
            .ledger
            .verify_arbitrary(&proof.raw_data, &request.message)
            .await?
        {
            self.store
                .set_status(request_key, RequestStatus::Invalid)
                .await?;
            return Ok(());
        }

        self.store
            .set_status(request_key, RequestStatus::Success)
            .await?;
        self.store.set_signer(request_key, &proof.address).await?;

        // First login from this address: record its public key, once.
        if self.store.pubkey(&proof.address).await?.is_none() {
            let pubkey = signer_pubkey_from_raw(&proof.raw_data).ok_or_else(|| {
                AppError::Collaborator("login payload carries no public key".into())
            })?;
            self.store.record_address(&proof.address, &pubkey).await?;
            info!("address book entry created for {}", proof.address);
        }

        Ok(())
    }

    async fn approved_swap(
        &self,
        request_key: &str,
        request: &SwapRequest,
        sign_data: serde_json::Value,
    ) -> AppResult<()> {
        let serialized = sign_data.to_string();

        self.store
            .set_status(request_key, RequestStatus::Success)
            .await?;
        self.store.set_sign_data(request_key, &serialized).await?;

        // Enqueue unconditionally; the worker re-validates the proof against
        // the recorded transaction before any payout.
        self.store
            .push_settlement(&SettlementQueueEntry {
                address: request.signer.clone(),
                sign_data: serialized,
            })
            .await?;

        info!("swap accepted, settlement queued for {}", request.signer);
        Ok(())
    }

    /// Independent, repeatable signature check. Reads the stored request and
    /// never mutates it; safe to call after settlement has completed.
    pub async fn verify(&self, request_key: &str, signature: &str) -> AppResult<VerifyOutcome> {
        let request = self.store.request(request_key).await?;
        if request.is_missing() {
            return Err(AppError::RequestNotFound);
        }

        let is_valid = self
            .ledger
            .verify_direct(&request.signer, signature, &request.message)
            .await?;

        Ok(VerifyOutcome {
            request_key: request_key.to_string(),
            signature: signature.to_string(),
            is_valid,
        })
    }

    fn request_key_of(&self, artifact: &str) -> AppResult<String> {
        artifact
            .strip_prefix(SIGN_SCHEME)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Collaborator(format!("relay artifact has no sign scheme: {artifact}"))
            })
    }

    fn station_artifact(&self, artifact: &str) -> String {
        artifact.replacen(
            SIGN_SCHEME,
            &format!("{}://", self.cfg.station_identity),
            1,
        )
    }
}
