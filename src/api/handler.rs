use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use validator::Validate;

use super::models::{invalid, ok, CallbackRequest, StatusResponse, SwapSignRequest, VerifyRequest};
use crate::swap::SwapService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SwapService>,
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /swap/token
pub async fn get_token_data(State(state): State<AppState>) -> Json<Value> {
    ok(json!({ "token": state.service.token_metadata() }))
}

/// GET /swap/requests/:request_key
pub async fn get_status(
    State(state): State<AppState>,
    Path(request_key): Path<String>,
) -> Json<Value> {
    match state.service.status(&request_key).await {
        Ok(request) => ok(StatusResponse::from(request)),
        Err(e) => {
            warn!("status lookup failed for {request_key}: {e}");
            invalid()
        }
    }
}

/// POST /swap/sign/login
pub async fn sign_login(State(state): State<AppState>) -> Json<Value> {
    match state.service.begin_login().await {
        Ok(challenge) => ok(challenge),
        Err(e) => {
            warn!("login challenge failed: {e}");
            invalid()
        }
    }
}

/// POST /swap/sign/swap
pub async fn sign_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapSignRequest>,
) -> Json<Value> {
    if let Err(e) = request.validate() {
        warn!("swap challenge rejected: {e}");
        return invalid();
    }

    match state
        .service
        .begin_swap(&request.signer, request.token_amount)
        .await
    {
        Ok(challenge) => ok(challenge),
        Err(e) => {
            warn!("swap challenge failed for {}: {e}", request.signer);
            invalid()
        }
    }
}

/// POST /swap/callback
pub async fn callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Json<Value> {
    match state
        .service
        .handle_callback(&request.request_key, request.approve, request.sign_data)
        .await
    {
        Ok(()) => ok(json!({})),
        Err(e) => {
            warn!("callback failed for {}: {e}", request.request_key);
            invalid()
        }
    }
}

/// POST /swap/verify — answers its result object directly, `isValid: false`
/// on any failure.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Json<Value> {
    match state
        .service
        .verify(&request.request_key, &request.signature)
        .await
    {
        Ok(outcome) => Json(serde_json::to_value(outcome).unwrap_or_default()),
        Err(e) => {
            warn!("verify failed for {}: {e}", request.request_key);
            Json(json!({
                "requestKey": request.request_key,
                "signature": request.signature,
                "isValid": false,
            }))
        }
    }
}
