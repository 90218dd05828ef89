use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::chain::LedgerSdk;
use crate::config::Config;
use crate::crypto;
use crate::error::{AppError, AppResult};
use crate::notify::Notifier;
use crate::swap::models::{SettlementQueueEntry, SettlementResult, SwapProof, TxReceipt};
use crate::swap::repository::SwapStore;

#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub treasury_address: String,
    pub token_denom: String,
    pub token_symbol: String,
    pub swap_rate: u64,
    pub treasury_key_cipher: String,
    pub shared_secret: String,
    pub explorer_host: String,
    pub poll_interval: Duration,
}

impl From<&Config> for SettlementConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            treasury_address: cfg.treasury_address.clone(),
            token_denom: cfg.token_denom.clone(),
            token_symbol: cfg.token_symbol.clone(),
            swap_rate: cfg.swap_rate,
            treasury_key_cipher: cfg.treasury_key_cipher.clone(),
            shared_secret: cfg.shared_secret.clone(),
            explorer_host: cfg.explorer_host.clone(),
            poll_interval: cfg.worker_poll_interval(),
        }
    }
}

/// Outcome of one worker iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// An entry was settled; the next one is drained without delay.
    Settled,
    /// The queue was empty.
    Idle,
    /// An entry was dequeued and dropped, or the pop itself failed.
    Failed,
}

/// Single sequential consumer of the settlement queue.
///
/// Exactly one entry is in flight at any time, which is what prevents a
/// concurrent double-spend of the treasury: the reward signing path has no
/// other caller. Every per-entry failure is recovered locally — logged,
/// followed by the poll delay, never retried, since the entry has already
/// left the queue. A crash between dequeue and completion therefore loses
/// that entry permanently.
pub struct SettlementWorker {
    store: SwapStore,
    ledger: Arc<dyn LedgerSdk>,
    notifier: Arc<dyn Notifier>,
    cfg: SettlementConfig,
}

impl SettlementWorker {
    pub fn new(
        store: SwapStore,
        ledger: Arc<dyn LedgerSdk>,
        notifier: Arc<dyn Notifier>,
        cfg: SettlementConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            cfg,
        }
    }

    /// Run until the shutdown signal fires. Never terminates on its own; no
    /// single-entry failure is fatal.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("🔄 settlement worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.process_next().await {
                WorkOutcome::Settled => continue,
                WorkOutcome::Idle | WorkOutcome::Failed => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.cfg.poll_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }
        info!("settlement worker stopped");
    }

    /// One iteration of the state machine: dequeue, validate, pay, record.
    pub async fn process_next(&self) -> WorkOutcome {
        let entry = match self.store.pop_settlement().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return WorkOutcome::Idle,
            Err(e) => {
                error!("settlement queue pop failed: {e}");
                return WorkOutcome::Failed;
            }
        };

        // The entry is already off the queue; any failure below drops it.
        match self.settle(entry).await {
            Ok(()) => WorkOutcome::Settled,
            Err(e) => {
                error!("settlement entry dropped: {e}");
                WorkOutcome::Failed
            }
        }
    }

    async fn settle(&self, entry: SettlementQueueEntry) -> AppResult<()> {
        let proof = SwapProof::decode(&entry.sign_data)?;

        if proof.chain_id != self.ledger.chain_id() {
            return Err(AppError::ChainMismatch(proof.chain_id));
        }
        if proof.address != entry.address {
            return Err(AppError::SignerMismatch {
                expected: entry.address,
                actual: proof.address,
            });
        }

        let receipt = proof.receipt()?;
        if receipt.code != 0 {
            return Err(AppError::TransactionFailed(receipt.code));
        }

        let amount = self.confirmed_transfer_amount(&receipt, &proof.address)?;
        info!("🚀 swap send start: {} {}{}", proof.address, amount, self.cfg.token_denom);

        self.notifier
            .send(&format!(
                "[SWAP][SUCCESS] {} {} sent to swap service\n{}/transactions/{}",
                amount, self.cfg.token_symbol, self.cfg.explorer_host, receipt.transaction_hash
            ))
            .await;

        let reward = amount / self.cfg.swap_rate;

        let signing_key =
            crypto::decrypt_with_secret(&self.cfg.shared_secret, &self.cfg.treasury_key_cipher)?;
        let outcome = self.ledger.send(&signing_key, &proof.address, reward).await?;
        if outcome.code != 0 {
            return Err(AppError::RewardTransferFailed(outcome.code));
        }

        self.store
            .append_result(&SettlementResult {
                address: proof.address.clone(),
                transaction_hash: outcome.transaction_hash.clone(),
            })
            .await?;

        info!(
            "🚀 swap send end: {} {}{} > {} reward: {}",
            proof.address, amount, self.cfg.token_denom, reward, outcome.transaction_hash
        );
        self.notifier
            .send(&format!(
                "[SWAP][SUCCESS] {} {}{} > {} reward\n{}/transactions/{}",
                proof.address,
                amount,
                self.cfg.token_symbol,
                reward,
                self.cfg.explorer_host,
                outcome.transaction_hash
            ))
            .await;

        Ok(())
    }

    /// Scan the receipt's event log for the one transfer event that names the
    /// treasury as recipient and the claimed signer as sender, and return its
    /// denomination-qualified amount in minor units.
    fn confirmed_transfer_amount(&self, receipt: &TxReceipt, signer: &str) -> AppResult<u64> {
        let events = receipt.events()?;

        let mut amounts = Vec::new();
        for event in events.iter().filter(|e| e.kind == "transfer") {
            let recipient_ok = event.attr("recipient") == Some(self.cfg.treasury_address.as_str());
            let sender_ok = event.attr("sender") == Some(signer);
            if !(recipient_ok && sender_ok) {
                continue;
            }

            let amount = event
                .attr("amount")
                .and_then(|v| v.strip_suffix(self.cfg.token_denom.as_str()))
                .ok_or_else(|| {
                    AppError::InvalidTransferProof(format!(
                        "transfer event carries no {} amount",
                        self.cfg.token_denom
                    ))
                })?;
            amounts.push(amount);
        }

        match amounts.as_slice() {
            [one] => one.parse::<u64>().map_err(|_| {
                AppError::InvalidTransferProof(format!("unparseable transfer amount: {one}"))
            }),
            [] => Err(AppError::InvalidTransferProof(
                "no transfer event matches treasury and signer".into(),
            )),
            _ => Err(AppError::InvalidTransferProof(
                "multiple qualifying transfer events".into(),
            )),
        }
    }
}
