use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::swap::models::SwapRequest;

// ========== REQUEST MODELS ==========

/// Request to begin a swap challenge. Amount is in whole major token units.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwapSignRequest {
    #[validate(length(min = 1))]
    pub signer: String,
    #[validate(range(min = 1))]
    pub token_amount: u64,
}

/// Signing app callback, relayed by the auth service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub request_key: String,
    pub approve: bool,
    #[serde(default)]
    pub sign_data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub request_key: String,
    pub signature: String,
}

// ========== RESPONSE MODELS ==========

/// Status view of a ledger record, synthetic-failed included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub message: String,
    pub status: i8,
    pub signer: String,
    pub added_at: String,
}

impl From<SwapRequest> for StatusResponse {
    fn from(request: SwapRequest) -> Self {
        Self {
            message: request.message,
            status: request.status.code(),
            signer: request.signer,
            added_at: request.added_at,
        }
    }
}

/// Success envelope: result code 0 plus the operation's result object.
pub fn ok<T: Serialize>(result: T) -> Json<Value> {
    Json(json!({ "code": 0, "message": "success", "result": result }))
}

/// Generic failure envelope. Callers cannot distinguish error kinds over
/// this boundary; the kind is logged server-side only.
pub fn invalid() -> Json<Value> {
    Json(json!({ "code": -1, "message": "invalid request", "result": {} }))
}
