//! Source-ledger SDK surface.
//!
//! The service consumes the ledger through this trait: sign-doc construction,
//! signature verification, unit conversion, and the funded reward transfer.
//! The HTTP client talks to the chain's REST gateway; tests substitute a
//! scripted fake.

mod client;

pub use client::{ChainConfig, HttpLedgerClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Smallest denomination per major token unit.
pub const MINOR_UNIT_FACTOR: u64 = 1_000_000;

pub fn to_minor_units(major: u64) -> u64 {
    major.saturating_mul(MINOR_UNIT_FACTOR)
}

pub fn to_major_units(minor: u64) -> u64 {
    minor / MINOR_UNIT_FACTOR
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// One bank-send instruction inside a sign doc.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMsg {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

/// Outcome of a broadcast transfer.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub code: i64,
    pub transaction_hash: String,
}

/// Extract the signer's public key embedded in an arbitrary-sign raw payload.
pub fn signer_pubkey_from_raw(raw_data: &str) -> Option<String> {
    let raw: serde_json::Value = serde_json::from_str(raw_data).ok()?;
    raw.get("pubkey")?.as_str().map(str::to_string)
}

#[async_trait]
pub trait LedgerSdk: Send + Sync {
    /// Chain id this client is configured for.
    fn chain_id(&self) -> &str;

    /// Serialize a signable document for the given transfer instructions.
    async fn make_sign_doc(
        &self,
        signer: &str,
        pubkey: &str,
        msgs: &[TransferMsg],
    ) -> AppResult<String>;

    /// Verify an arbitrary-message signature payload against the message the
    /// challenge was issued for.
    async fn verify_arbitrary(&self, raw_data: &str, message: &str) -> AppResult<bool>;

    /// Verify a direct-document signature against a claimed address and the
    /// stored sign doc.
    async fn verify_direct(
        &self,
        address: &str,
        signature: &str,
        sign_doc: &str,
    ) -> AppResult<bool>;

    /// Submit a funded transfer of `amount` major units from the treasury
    /// identity derived from `signing_key` to `to`.
    async fn send(&self, signing_key: &[u8], to: &str, amount: u64) -> AppResult<TxOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversion() {
        assert_eq!(to_minor_units(10), 10_000_000);
        assert_eq!(to_major_units(2_500_000), 2);
        assert_eq!(to_major_units(999_999), 0);
    }

    #[test]
    fn pubkey_extraction() {
        let raw = r#"{"pubkey":"cHVia2V5","signature":"c2ln"}"#;
        assert_eq!(signer_pubkey_from_raw(raw).as_deref(), Some("cHVia2V5"));
        assert_eq!(signer_pubkey_from_raw("not json"), None);
        assert_eq!(signer_pubkey_from_raw("{}"), None);
    }
}
