//! Relay/auth service client.
//!
//! The relay brokers the mobile signing app: it exchanges the project secret
//! for a session and issues scannable sign-challenge artifacts, in either
//! arbitrary-message mode (login) or direct-document mode (swap).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// URI scheme the relay issues artifacts under. The request key is the
/// artifact with this scheme stripped.
pub const SIGN_SCHEME: &str = "sign://";

#[derive(Debug, Clone)]
pub struct RelaySession {
    pub project_key: String,
}

#[async_trait]
pub trait SignRelay: Send + Sync {
    async fn connect(&self, project_secret: &str) -> AppResult<RelaySession>;

    async fn arbitrary_sign_qr(
        &self,
        session: &RelaySession,
        message: &str,
        info: &str,
    ) -> AppResult<String>;

    async fn direct_sign_qr(
        &self,
        session: &RelaySession,
        signer: &str,
        sign_doc: &str,
        info: &str,
        argument: serde_json::Value,
    ) -> AppResult<String>;
}

/// Relay REST responses wrap everything in `{code, message, result}`; only
/// code 0 carries a usable result.
#[derive(Debug, Deserialize)]
struct RelayEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResult {
    project_key: String,
}

#[derive(Debug, Deserialize)]
struct QrResult {
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequestBody<'a> {
    qr_type: i32,
    #[serde(rename = "type")]
    sign_type: i32,
    signer: &'a str,
    message: &'a str,
    info: &'a str,
    argument: serde_json::Value,
    is_multiple: bool,
}

pub struct HttpSignRelay {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSignRelay {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        bearer: Option<&str>,
    ) -> AppResult<T> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let envelope: RelayEnvelope<T> = request.send().await?.json().await?;
        if envelope.code != 0 {
            return Err(AppError::Collaborator(format!(
                "relay error {}: {}",
                envelope.code, envelope.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| AppError::Collaborator("relay returned an empty result".into()))
    }
}

#[async_trait]
impl SignRelay for HttpSignRelay {
    async fn connect(&self, project_secret: &str) -> AppResult<RelaySession> {
        let auth: AuthResult = self
            .post(
                "/v1/projects/auth",
                &json!({ "projectSecretKey": project_secret }),
                None,
            )
            .await?;
        Ok(RelaySession {
            project_key: auth.project_key,
        })
    }

    async fn arbitrary_sign_qr(
        &self,
        session: &RelaySession,
        message: &str,
        info: &str,
    ) -> AppResult<String> {
        let qr: QrResult = self
            .post(
                "/v1/projects/sign",
                &SignRequestBody {
                    qr_type: 0,
                    sign_type: 0,
                    signer: "",
                    message,
                    info,
                    argument: json!({}),
                    is_multiple: false,
                },
                Some(&session.project_key),
            )
            .await?;
        Ok(qr.data)
    }

    async fn direct_sign_qr(
        &self,
        session: &RelaySession,
        signer: &str,
        sign_doc: &str,
        info: &str,
        argument: serde_json::Value,
    ) -> AppResult<String> {
        let qr: QrResult = self
            .post(
                "/v1/projects/sign",
                &SignRequestBody {
                    qr_type: 0,
                    sign_type: 1,
                    signer,
                    message: sign_doc,
                    info,
                    argument,
                    is_multiple: false,
                },
                Some(&session.project_key),
            )
            .await?;
        Ok(qr.data)
    }
}
