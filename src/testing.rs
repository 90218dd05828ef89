//! Scripted fakes for the collaborator traits, shared across module tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::chain::{LedgerSdk, TransferMsg, TxOutcome};
use crate::error::AppResult;
use crate::notify::Notifier;
use crate::relay::{RelaySession, SignRelay};

/// Relay fake: issues deterministic `sign://` artifacts without any network.
pub struct FakeRelay;

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

#[async_trait]
impl SignRelay for FakeRelay {
    async fn connect(&self, _project_secret: &str) -> AppResult<RelaySession> {
        Ok(RelaySession {
            project_key: "project-key".into(),
        })
    }

    async fn arbitrary_sign_qr(
        &self,
        _session: &RelaySession,
        message: &str,
        _info: &str,
    ) -> AppResult<String> {
        Ok(format!("sign://{message}"))
    }

    async fn direct_sign_qr(
        &self,
        _session: &RelaySession,
        signer: &str,
        _sign_doc: &str,
        _info: &str,
        _argument: serde_json::Value,
    ) -> AppResult<String> {
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        Ok(format!("sign://swap-{signer}-{seq}"))
    }
}

/// Ledger fake: signature checks return a fixed verdict, sends are recorded
/// and answer with scripted outcomes (code 0, hash `REWARD_HASH` by default).
pub struct FakeLedger {
    chain: String,
    accept_signatures: bool,
    pub sends: Mutex<Vec<(String, u64)>>,
    send_results: Mutex<VecDeque<TxOutcome>>,
}

impl FakeLedger {
    pub fn accepting(chain: &str) -> Self {
        Self {
            chain: chain.to_string(),
            accept_signatures: true,
            sends: Mutex::new(Vec::new()),
            send_results: Mutex::new(VecDeque::new()),
        }
    }

    pub fn rejecting(chain: &str) -> Self {
        Self {
            accept_signatures: false,
            ..Self::accepting(chain)
        }
    }

    pub fn queue_send_result(&self, code: i64, transaction_hash: &str) {
        self.send_results.lock().unwrap().push_back(TxOutcome {
            code,
            transaction_hash: transaction_hash.to_string(),
        });
    }
}

#[async_trait]
impl LedgerSdk for FakeLedger {
    fn chain_id(&self) -> &str {
        &self.chain
    }

    async fn make_sign_doc(
        &self,
        signer: &str,
        pubkey: &str,
        msgs: &[TransferMsg],
    ) -> AppResult<String> {
        Ok(json!({ "signer": signer, "pubkey": pubkey, "msgs": msgs }).to_string())
    }

    async fn verify_arbitrary(&self, _raw_data: &str, _message: &str) -> AppResult<bool> {
        Ok(self.accept_signatures)
    }

    async fn verify_direct(
        &self,
        _address: &str,
        _signature: &str,
        _sign_doc: &str,
    ) -> AppResult<bool> {
        Ok(self.accept_signatures)
    }

    async fn send(&self, _signing_key: &[u8], to: &str, amount: u64) -> AppResult<TxOutcome> {
        self.sends.lock().unwrap().push((to.to_string(), amount));
        Ok(self
            .send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TxOutcome {
                code: 0,
                transaction_hash: "REWARD_HASH".into(),
            }))
    }
}

/// Notifier fake that captures every message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

/// A login callback payload for `address`, carrying an embedded public key.
pub fn login_payload(address: &str) -> serde_json::Value {
    let raw_data = json!({
        "pubkey": format!("pubkey-{address}"),
        "signature": "c2lnbmF0dXJl",
    })
    .to_string();
    json!({ "address": address, "rawData": raw_data })
}
