//! PIN protection for cached sessions.
//!
//! The PIN is encrypted under the current session id, so the ciphertext
//! changes with every login. The default cipher stretches the session id
//! with Argon2id into a 256-bit key and seals the PIN with ChaCha20-Poly1305
//! under a fresh random nonce. Output is `hex(nonce || ciphertext)`.
//!
//! The production gateway uses its own DES-based scheme and cannot open
//! what `ChaChaPinCipher` produces. Callers that forward the encrypted PIN to
//! the gateway must supply a compatible `PinCipher` through
//! `ClientBuilder::cipher`.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use thiserror::Error;

/// Domain separation salt for session-id key derivation
const KEY_DERIVATION_SALT: &[u8] = b"readycash-pin-v1";

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Argon2 memory cost in KiB. Session ids are server-issued, so the
/// stretching only needs to be moderate.
const KDF_MEMORY_KIB: u32 = 4096;
const KDF_ITERATIONS: u32 = 1;
const KDF_PARALLELISM: u32 = 1;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Cipher key is empty")]
    EmptyKey,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed")]
    Encryption,
}

/// Reversible symmetric encryption of a short secret under a string key.
///
/// Only encryption lives here. Implementations used against the real gateway
/// must match the scheme it decrypts with.
pub trait PinCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, CipherError>;
}

/// Argon2id + ChaCha20-Poly1305 PIN cipher.
///
/// Protects the PIN at rest in the credential store. The gateway cannot
/// decrypt its output.
#[derive(Debug, Clone)]
pub struct ChaChaPinCipher {
    params: Params,
}

impl ChaChaPinCipher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn derive_key(&self, key: &str) -> Result<[u8; KEY_LEN], CipherError> {
        if key.is_empty() {
            return Err(CipherError::EmptyKey);
        }
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = [0u8; KEY_LEN];
        argon2
            .hash_password_into(key.as_bytes(), KEY_DERIVATION_SALT, &mut out)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        Ok(out)
    }
}

impl Default for ChaChaPinCipher {
    fn default() -> Self {
        let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_PARALLELISM, Some(KEY_LEN))
            .unwrap_or_default();
        Self { params }
    }
}

impl PinCipher for ChaChaPinCipher {
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, CipherError> {
        let key = self.derive_key(key)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }
}
