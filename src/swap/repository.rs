use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::AppResult;
use crate::store::DurableStore;

use super::models::{
    RequestStatus, RequestType, SettlementQueueEntry, SettlementResult, SwapRequest,
    ADDED_AT_FORMAT,
};

const REQUEST_KEY_PREFIX: &str = "swap:request:";
const ADDRESSBOOK_KEY: &str = "swap:addressbook";
const REWARD_QUEUE_KEY: &str = "swap:reward:queue";
const REWARD_RESULT_KEY: &str = "swap:reward:result";

/// Repository over the durable store: request ledger, address book,
/// settlement queue and result log. Shared by the orchestrator (producer
/// side) and the settlement worker (sole queue consumer).
#[derive(Clone)]
pub struct SwapStore {
    store: Arc<dyn DurableStore>,
}

impl SwapStore {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    fn request_key(request_key: &str) -> String {
        format!("{REQUEST_KEY_PREFIX}{request_key}")
    }

    // ========== REQUEST LEDGER ==========

    /// Persist a new request and schedule its expiry. Fields are written
    /// sequentially; a reader may observe the record mid-create. Only the
    /// request's own callback writes to it afterwards, so no locking.
    pub async fn create_request(
        &self,
        request_key: &str,
        request_type: RequestType,
        message: &str,
        signer: &str,
        extra: &str,
        ttl: Duration,
    ) -> AppResult<()> {
        let key = Self::request_key(request_key);
        let added_at = Utc::now().format(ADDED_AT_FORMAT).to_string();

        self.store.hash_set(&key, "type", request_type.as_str()).await?;
        self.store.hash_set(&key, "message", message).await?;
        self.store.hash_set(&key, "status", "0").await?;
        self.store.hash_set(&key, "signer", signer).await?;
        self.store.hash_set(&key, "signData", "").await?;
        self.store.hash_set(&key, "extra", extra).await?;
        self.store.hash_set(&key, "addedAt", &added_at).await?;

        self.store.expire(&key, ttl).await
    }

    /// Full record, or the synthetic failed record when absent or expired.
    pub async fn request(&self, request_key: &str) -> AppResult<SwapRequest> {
        let fields = self
            .store
            .hash_get_all(&Self::request_key(request_key))
            .await?;
        Ok(SwapRequest::from_fields(fields))
    }

    pub async fn set_status(&self, request_key: &str, status: RequestStatus) -> AppResult<()> {
        self.store
            .hash_set(
                &Self::request_key(request_key),
                "status",
                &status.code().to_string(),
            )
            .await
    }

    pub async fn set_signer(&self, request_key: &str, signer: &str) -> AppResult<()> {
        self.store
            .hash_set(&Self::request_key(request_key), "signer", signer)
            .await
    }

    pub async fn set_sign_data(&self, request_key: &str, sign_data: &str) -> AppResult<()> {
        self.store
            .hash_set(&Self::request_key(request_key), "signData", sign_data)
            .await
    }

    // ========== ADDRESS BOOK ==========

    pub async fn pubkey(&self, address: &str) -> AppResult<Option<String>> {
        self.store.hash_get(ADDRESSBOOK_KEY, address).await
    }

    pub async fn record_address(&self, address: &str, pubkey: &str) -> AppResult<()> {
        self.store.hash_set(ADDRESSBOOK_KEY, address, pubkey).await
    }

    // ========== SETTLEMENT QUEUE & RESULT LOG ==========

    pub async fn push_settlement(&self, entry: &SettlementQueueEntry) -> AppResult<()> {
        self.store
            .queue_push(REWARD_QUEUE_KEY, &serde_json::to_string(entry)?)
            .await
    }

    pub async fn pop_settlement(&self) -> AppResult<Option<SettlementQueueEntry>> {
        match self.store.queue_pop(REWARD_QUEUE_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn append_result(&self, result: &SettlementResult) -> AppResult<()> {
        self.store
            .log_append(
                REWARD_RESULT_KEY,
                Utc::now().timestamp(),
                &serde_json::to_string(result)?,
            )
            .await
    }

    /// Completed payouts in completion order, for audit inspection.
    pub async fn settlement_results(&self) -> AppResult<Vec<SettlementResult>> {
        let entries = self.store.log_entries(REWARD_RESULT_KEY).await?;
        entries
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::swap::models::RequestStatus;

    fn swap_store() -> SwapStore {
        SwapStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn read_after_create_returns_pending_with_exact_fields() {
        let store = swap_store();
        store
            .create_request(
                "req-1",
                RequestType::Login,
                "nonce-value",
                "",
                "",
                Duration::from_secs(120),
            )
            .await
            .unwrap();

        let request = store.request("req-1").await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.request_type, Some(RequestType::Login));
        assert_eq!(request.message, "nonce-value");
        assert_eq!(request.signer, "");
        assert_eq!(request.sign_data, "");
        assert_eq!(request.extra, "");
        assert!(!request.added_at.is_empty());
    }

    #[tokio::test]
    async fn elapsed_ttl_reads_as_synthetic_failed() {
        let store = swap_store();
        store
            .create_request(
                "req-1",
                RequestType::Swap,
                "doc",
                "addr",
                "",
                Duration::from_secs(0),
            )
            .await
            .unwrap();

        let request = store.request("req-1").await.unwrap();
        assert!(request.is_missing());
        assert_eq!(request.status, RequestStatus::Failed);
        assert!(request.message.is_empty());
    }

    #[tokio::test]
    async fn unknown_key_reads_as_synthetic_failed() {
        let store = swap_store();
        let request = store.request("nope").await.unwrap();
        assert!(request.is_missing());
    }

    #[tokio::test]
    async fn settlement_queue_roundtrip() {
        let store = swap_store();
        let entry = SettlementQueueEntry {
            address: "addrA".into(),
            sign_data: "{}".into(),
        };
        store.push_settlement(&entry).await.unwrap();

        let popped = store.pop_settlement().await.unwrap().unwrap();
        assert_eq!(popped.address, "addrA");
        assert!(store.pop_settlement().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settlement_results_preserve_append_order() {
        let store = swap_store();
        for hash in ["h1", "h2"] {
            store
                .append_result(&SettlementResult {
                    address: "addrA".into(),
                    transaction_hash: hash.into(),
                })
                .await
                .unwrap();
        }

        let results = store.settlement_results().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].transaction_hash, "h1");
        assert_eq!(results[1].transaction_hash, "h2");
    }
}
