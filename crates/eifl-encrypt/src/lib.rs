//! # eifl-encrypt
//!
//! Authenticated-encryption-at-rest for [`eifl_types::Secret`] values.
//!
//! A single process-wide key is derived from `EIFL_ENCRYPTION_KEY` by
//! PBKDF2-HMAC-SHA-256 (100,000 iterations, a fixed application salt —
//! unlike a typical per-value random salt, spec §4.B calls for one
//! process-wide key so every ciphertext can be decrypted without storing a
//! salt alongside it) and cached after first use. The derived key
//! encrypts/decrypts individual secret values with AES-256-GCM, using a
//! fresh random 96-bit IV per encryption. Ciphertext and IV are both
//! base64-encoded for storage.
//!
//! ## Failure modes (spec §4.B)
//!
//! - `EIFL_ENCRYPTION_KEY` missing → [`EiflError::EncryptionNotConfigured`]
//! - key shorter than 32 chars → [`EiflError::Configuration`]
//! - decrypt failure (wrong key, corrupted ciphertext) →
//!   [`EiflError::Decrypt`] — the caller skips that one secret rather than
//!   failing the whole dispatch.

use std::sync::OnceLock;

use aes_gcm::aead::{Aead, KeyInit, OsRng, rand_core::RngCore};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use eifl_types::EiflError;
use pbkdf2::pbkdf2_hmac_array;
use sha2::Sha256;

/// Fixed application salt for key derivation. Spec §4.B: a single
/// process-wide key derived once, not a per-secret random salt.
const APPLICATION_SALT: &[u8] = b"eifl-ci-server-secret-store-v1";
const PBKDF2_ITERATIONS: u32 = 100_000;
const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const MIN_KEY_LEN: usize = 32;

static DERIVED_KEY: OnceLock<[u8; KEY_SIZE]> = OnceLock::new();

/// A ciphertext + IV pair ready to be persisted on a [`eifl_types::Secret`]
/// row.
#[derive(Debug, Clone)]
pub struct EncryptedValue {
    pub ciphertext_b64: String,
    pub iv_b64: String,
}

/// Resolve and cache the process-wide AEAD key from `EIFL_ENCRYPTION_KEY`.
///
/// Spec §5: "The derived AEAD key is a process-wide read-only value after
/// first computation." Subsequent calls return the cached key without
/// re-running PBKDF2.
pub fn derived_key() -> Result<&'static [u8; KEY_SIZE], EiflError> {
    if let Some(key) = DERIVED_KEY.get() {
        return Ok(key);
    }

    let secret = std::env::var("EIFL_ENCRYPTION_KEY").map_err(|_| EiflError::EncryptionNotConfigured)?;
    if secret.len() < MIN_KEY_LEN {
        return Err(EiflError::Configuration(format!(
            "EIFL_ENCRYPTION_KEY must be at least {MIN_KEY_LEN} characters"
        )));
    }

    let key = pbkdf2_hmac_array::<Sha256, KEY_SIZE>(secret.as_bytes(), APPLICATION_SALT, PBKDF2_ITERATIONS);
    Ok(DERIVED_KEY.get_or_init(|| key))
}

/// Returns true if `EIFL_ENCRYPTION_KEY` is set and passes basic
/// validation, without caching a key — used by secret CRUD endpoints to
/// decide whether to report `EncryptionNotConfigured` up front.
pub fn is_configured() -> bool {
    std::env::var("EIFL_ENCRYPTION_KEY")
        .map(|s| s.len() >= MIN_KEY_LEN)
        .unwrap_or(false)
}

/// Encrypt a secret's plaintext value using AES-256-GCM with a random
/// 96-bit IV.
pub fn encrypt(plaintext: &str) -> Result<EncryptedValue, EiflError> {
    let key = derived_key()?;

    let mut iv_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut iv_bytes);

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| EiflError::Configuration(format!("failed to initialize cipher: {e}")))?;
    let nonce = Nonce::from_slice(&iv_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| EiflError::Configuration("encryption failed".to_string()))?;

    Ok(EncryptedValue {
        ciphertext_b64: BASE64.encode(ciphertext),
        iv_b64: BASE64.encode(iv_bytes),
    })
}

/// Decrypt a previously encrypted secret value. Returns
/// [`EiflError::Decrypt`] for any failure (wrong key, corrupted base64,
/// corrupted ciphertext, auth tag mismatch) — the caller is expected to
/// name the secret in that error.
pub fn decrypt(ciphertext_b64: &str, iv_b64: &str, secret_name: &str) -> Result<String, EiflError> {
    let decrypt_err = || EiflError::Decrypt {
        name: secret_name.to_string(),
    };

    let key = derived_key()?;
    let ciphertext = BASE64.decode(ciphertext_b64).map_err(|_| decrypt_err())?;
    let iv = BASE64.decode(iv_b64).map_err(|_| decrypt_err())?;
    if iv.len() != NONCE_SIZE {
        return Err(decrypt_err());
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| decrypt_err())?;
    let nonce = Nonce::from_slice(&iv);
    let plaintext = cipher.decrypt(nonce, ciphertext.as_slice()).map_err(|_| decrypt_err())?;

    String::from_utf8(plaintext).map_err(|_| decrypt_err())
}
