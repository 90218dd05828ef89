use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Timestamp format of `addedAt`, UTC with second precision.
pub const ADDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Login,
    Swap,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Login => "LOGIN",
            RequestType::Swap => "SWAP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOGIN" => Some(RequestType::Login),
            "SWAP" => Some(RequestType::Swap),
            _ => None,
        }
    }
}

/// Request lifecycle status, stored and served by numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Success,
    Failed,
    Invalid,
}

impl RequestStatus {
    pub fn code(&self) -> i8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Success => 1,
            RequestStatus::Failed => -1,
            RequestStatus::Invalid => -2,
        }
    }

    pub fn from_code(code: i8) -> Self {
        match code {
            0 => RequestStatus::Pending,
            1 => RequestStatus::Success,
            -2 => RequestStatus::Invalid,
            _ => RequestStatus::Failed,
        }
    }
}

/// One signing request tracked in the request ledger.
///
/// A record that is absent or expired reads as the synthetic
/// [`SwapRequest::failed`] record; since no transition ever sets `Failed`
/// explicitly, `status == Failed` is equivalent to "not found".
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub request_type: Option<RequestType>,
    pub status: RequestStatus,
    pub message: String,
    pub signer: String,
    pub sign_data: String,
    pub extra: String,
    pub added_at: String,
}

impl SwapRequest {
    /// Synthetic record served for an absent or expired request key.
    pub fn failed() -> Self {
        Self {
            request_type: None,
            status: RequestStatus::Failed,
            message: String::new(),
            signer: String::new(),
            sign_data: String::new(),
            extra: String::new(),
            added_at: String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.status == RequestStatus::Failed
    }

    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        if fields.is_empty() {
            return Self::failed();
        }

        let status = fields
            .get("status")
            .and_then(|s| s.parse::<i8>().ok())
            .map(RequestStatus::from_code)
            .unwrap_or(RequestStatus::Failed);

        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();

        Self {
            request_type: fields.get("type").and_then(|t| RequestType::parse(t)),
            status,
            message: field("message"),
            signer: field("signer"),
            sign_data: field("signData"),
            extra: field("extra"),
            added_at: field("addedAt"),
        }
    }
}

/// Challenge handed back to the caller of a begin-login/begin-swap operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignChallenge {
    pub request_key: String,
    pub qrcode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenData {
    pub denom: String,
    pub symbol: String,
}

/// Result of the independent verify query. Never mutates ledger state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub request_key: String,
    pub signature: String,
    pub is_valid: bool,
}

// ========== CALLBACK PAYLOADS ==========
//
// The signed payload shape varies by request type; each is decoded
// explicitly before use so a malformed payload surfaces as a typed error.

/// Payload of an approved LOGIN callback. `raw_data` embeds the signer's
/// public key and the signature over the challenge nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProof {
    pub address: String,
    pub raw_data: String,
}

/// Payload of an approved SWAP callback and of a settlement queue entry's
/// `sign_data`: the proof that the source-chain transfer was broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapProof {
    pub chain_id: String,
    pub address: String,
    pub raw_data: String,
}

impl SwapProof {
    pub fn decode(sign_data: &str) -> AppResult<Self> {
        serde_json::from_str(sign_data)
            .map_err(|e| AppError::InvalidTransferProof(format!("malformed proof: {e}")))
    }

    pub fn receipt(&self) -> AppResult<TxReceipt> {
        serde_json::from_str(&self.raw_data)
            .map_err(|e| AppError::InvalidTransferProof(format!("malformed receipt: {e}")))
    }
}

/// Broadcast receipt echoed inside a swap proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub code: i64,
    pub transaction_hash: String,
    pub raw_log: String,
}

impl TxReceipt {
    pub fn events(&self) -> AppResult<Vec<LogEvent>> {
        serde_json::from_str(&self.raw_log)
            .map_err(|e| AppError::InvalidTransferProof(format!("malformed event log: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl LogEvent {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

// ========== SETTLEMENT RECORDS ==========

/// Accepted swap handed from the orchestrator to the settlement worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementQueueEntry {
    pub address: String,
    pub sign_data: String,
}

/// Completed payout, appended to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub address: String,
    pub transaction_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Success,
            RequestStatus::Failed,
            RequestStatus::Invalid,
        ] {
            assert_eq!(RequestStatus::from_code(status.code()), status);
        }
    }

    #[test]
    fn empty_fields_read_as_failed() {
        let request = SwapRequest::from_fields(HashMap::new());
        assert!(request.is_missing());
        assert_eq!(request.status, RequestStatus::Failed);
    }

    #[test]
    fn fields_without_status_read_as_failed() {
        let mut fields = HashMap::new();
        fields.insert("message".to_string(), "nonce".to_string());
        let request = SwapRequest::from_fields(fields);
        assert_eq!(request.status, RequestStatus::Failed);
        assert_eq!(request.message, "nonce");
    }

    #[test]
    fn swap_proof_decodes_nested_receipt() {
        let raw_log = serde_json::json!([{
            "type": "transfer",
            "attributes": [
                {"key": "recipient", "value": "treasury"},
                {"key": "sender", "value": "addrA"},
                {"key": "amount", "value": "1000000uswap"},
            ],
        }])
        .to_string();
        let raw_data = serde_json::json!({
            "code": 0,
            "transactionHash": "ABC123",
            "rawLog": raw_log,
        })
        .to_string();
        let sign_data = serde_json::json!({
            "chainId": "chain-1",
            "address": "addrA",
            "rawData": raw_data,
        })
        .to_string();

        let proof = SwapProof::decode(&sign_data).unwrap();
        assert_eq!(proof.chain_id, "chain-1");
        let receipt = proof.receipt().unwrap();
        assert_eq!(receipt.code, 0);
        let events = receipt.events().unwrap();
        assert_eq!(events[0].attr("amount"), Some("1000000uswap"));
    }

    #[test]
    fn malformed_proof_is_typed() {
        assert!(matches!(
            SwapProof::decode("not json"),
            Err(crate::error::AppError::InvalidTransferProof(_))
        ));
    }
}
