//! Encryption of the treasury's secret key material at rest.
//!
//! The key is derived from the shared secret with Argon2id and the payload is
//! sealed with AES-256-GCM. Wire format: `salt:nonce_hex:ciphertext_hex`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{password_hash::SaltString, Argon2};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid format, expected salt:nonce:ciphertext")]
    InvalidFormat,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("decryption failed (wrong secret?)")]
    Decrypt,

    #[error("encryption failed")]
    Encrypt,
}

fn derive_key(secret: &str, salt: &str) -> Result<[u8; 32], CryptoError> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut key)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(key)
}

pub fn encrypt_with_secret(secret: &str, data: &[u8]) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    let key = derive_key(secret, salt.as_str())?;

    let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|_| CryptoError::Encrypt)?;

    Ok(format!(
        "{}:{}:{}",
        salt.as_str(),
        hex::encode(nonce),
        hex::encode(ciphertext)
    ))
}

pub fn decrypt_with_secret(secret: &str, formatted: &str) -> Result<Vec<u8>, CryptoError> {
    let parts: Vec<&str> = formatted.split(':').collect();
    if parts.len() != 3 {
        return Err(CryptoError::InvalidFormat);
    }

    let key = derive_key(secret, parts[0])?;
    let nonce_bytes = hex::decode(parts[1]).map_err(|_| CryptoError::InvalidHex)?;
    let cipher_bytes = hex::decode(parts[2]).map_err(|_| CryptoError::InvalidHex)?;
    if nonce_bytes.len() != 12 {
        return Err(CryptoError::InvalidFormat);
    }

    let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), cipher_bytes.as_ref())
        .map_err(|_| CryptoError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let sealed = encrypt_with_secret("hunter2", b"treasury key material").unwrap();
        let opened = decrypt_with_secret("hunter2", &sealed).unwrap();
        assert_eq!(opened, b"treasury key material");
    }

    #[test]
    fn wrong_secret_fails() {
        let sealed = encrypt_with_secret("hunter2", b"treasury key material").unwrap();
        assert!(matches!(
            decrypt_with_secret("hunter3", &sealed),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn malformed_input_fails() {
        assert!(matches!(
            decrypt_with_secret("hunter2", "not-sealed-data"),
            Err(CryptoError::InvalidFormat)
        ));
        assert!(matches!(
            decrypt_with_secret("hunter2", "salt:zz:zz"),
            Err(CryptoError::InvalidHex)
        ));
    }
}
