use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::{to_minor_units, LedgerSdk, TransferMsg, TxOutcome};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: String,
    pub rest_url: String,
    pub denom: String,
    pub treasury_address: String,
}

/// Ledger client against the chain's REST gateway. Signatures are Ed25519
/// over the exact serialized payload bytes, carried base64-encoded.
pub struct HttpLedgerClient {
    cfg: ChainConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SignaturePayload {
    pubkey: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    pubkey: String,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    code: i64,
    txhash: String,
}

impl HttpLedgerClient {
    pub fn new(cfg: ChainConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { cfg, client }
    }

    fn verify_ed25519(pubkey_b64: &str, signature_b64: &str, message: &[u8]) -> AppResult<bool> {
        let pk_bytes = BASE64
            .decode(pubkey_b64)
            .map_err(|_| AppError::Collaborator("invalid base64 public key".into()))?;
        let pk_arr: [u8; 32] = pk_bytes
            .try_into()
            .map_err(|_| AppError::Collaborator("public key must be 32 bytes".into()))?;
        let pubkey = VerifyingKey::from_bytes(&pk_arr)
            .map_err(|_| AppError::Collaborator("invalid public key".into()))?;

        let sig_bytes = BASE64
            .decode(signature_b64)
            .map_err(|_| AppError::Collaborator("invalid base64 signature".into()))?;
        let sig_arr: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| AppError::Collaborator("signature must be 64 bytes".into()))?;
        let signature = Signature::from_bytes(&sig_arr);

        match pubkey.verify(message, &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("signature verification failed: {e:?}");
                Ok(false)
            }
        }
    }

    async fn account_pubkey(&self, address: &str) -> AppResult<String> {
        let url = format!("{}/v1/accounts/{}", self.cfg.rest_url, address);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Collaborator(format!(
                "account lookup failed for {address}: {}",
                response.status()
            )));
        }
        let account: AccountResponse = response.json().await?;
        Ok(account.pubkey)
    }
}

#[async_trait]
impl LedgerSdk for HttpLedgerClient {
    fn chain_id(&self) -> &str {
        &self.cfg.chain_id
    }

    async fn make_sign_doc(
        &self,
        signer: &str,
        pubkey: &str,
        msgs: &[TransferMsg],
    ) -> AppResult<String> {
        let doc = json!({
            "chainId": self.cfg.chain_id,
            "signer": signer,
            "pubkey": pubkey,
            "msgs": msgs,
        });
        Ok(doc.to_string())
    }

    async fn verify_arbitrary(&self, raw_data: &str, message: &str) -> AppResult<bool> {
        let payload: SignaturePayload = serde_json::from_str(raw_data)
            .map_err(|e| AppError::Collaborator(format!("malformed sign payload: {e}")))?;
        Self::verify_ed25519(&payload.pubkey, &payload.signature, message.as_bytes())
    }

    async fn verify_direct(
        &self,
        address: &str,
        signature: &str,
        sign_doc: &str,
    ) -> AppResult<bool> {
        let pubkey = self.account_pubkey(address).await?;
        Self::verify_ed25519(&pubkey, signature, sign_doc.as_bytes())
    }

    async fn send(&self, signing_key: &[u8], to: &str, amount: u64) -> AppResult<TxOutcome> {
        let key_arr: [u8; 32] = signing_key
            .try_into()
            .map_err(|_| AppError::Collaborator("treasury key must be 32 bytes".into()))?;
        let key = SigningKey::from_bytes(&key_arr);

        let tx = json!({
            "chainId": self.cfg.chain_id,
            "fromAddress": self.cfg.treasury_address,
            "toAddress": to,
            "amount": [{
                "denom": self.cfg.denom,
                "amount": to_minor_units(amount).to_string(),
            }],
        });
        let tx_bytes = tx.to_string();
        let signature = key.sign(tx_bytes.as_bytes());

        let url = format!("{}/v1/txs", self.cfg.rest_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "tx": tx,
                "pubkey": BASE64.encode(key.verifying_key().as_bytes()),
                "signature": BASE64.encode(signature.to_bytes()),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Collaborator(format!(
                "broadcast rejected: {}",
                response.status()
            )));
        }

        let broadcast: BroadcastResponse = response.json().await?;
        Ok(TxOutcome {
            code: broadcast.code,
            transaction_hash: broadcast.txhash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpLedgerClient {
        HttpLedgerClient::new(ChainConfig {
            chain_id: "swap-mainnet-1".into(),
            rest_url: "http://localhost:1317".into(),
            denom: "uswap".into(),
            treasury_address: "treasury".into(),
        })
    }

    #[tokio::test]
    async fn arbitrary_signature_roundtrip() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let message = "a9b8c7d6-nonce";
        let signature = key.sign(message.as_bytes());
        let raw = json!({
            "pubkey": BASE64.encode(key.verifying_key().as_bytes()),
            "signature": BASE64.encode(signature.to_bytes()),
        })
        .to_string();

        let client = client();
        assert!(client.verify_arbitrary(&raw, message).await.unwrap());
        assert!(!client.verify_arbitrary(&raw, "another message").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let client = client();
        assert!(client.verify_arbitrary("not json", "msg").await.is_err());
        assert!(client.verify_arbitrary("{}", "msg").await.is_err());
    }

    #[tokio::test]
    async fn sign_doc_embeds_chain_and_msgs() {
        let client = client();
        let doc = client
            .make_sign_doc(
                "addr1",
                "pk",
                &[TransferMsg {
                    from_address: "addr1".into(),
                    to_address: "treasury".into(),
                    amount: vec![crate::chain::Coin {
                        denom: "uswap".into(),
                        amount: "10000000".into(),
                    }],
                }],
            )
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed["chainId"], "swap-mainnet-1");
        assert_eq!(parsed["msgs"][0]["toAddress"], "treasury");
    }
}
