use chrono::{DateTime, Duration, Utc};

use super::cipher::{CipherError, PinCipher};

/// Live authenticated context for one account.
///
/// A session is usable only when every field is populated and the expiry
/// lies in the future; there is no partial validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: String,
    pub session_id: String,
    /// PIN encrypted under `session_id`. Recomputed on every login.
    pub encrypted_pin: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() || self.session_id.is_empty() || self.encrypted_pin.is_empty() {
            return false;
        }
        self.expires_at.is_some_and(|expiry| now < expiry)
    }

    /// Encrypt `pin` under `key` and keep the ciphertext.
    ///
    /// On failure the stored ciphertext is cleared, leaving the session
    /// invalid.
    pub fn set_pin<C: PinCipher + ?Sized>(
        &mut self,
        pin: &str,
        key: &str,
        cipher: &C,
    ) -> Result<(), CipherError> {
        match cipher.encrypt(pin, key) {
            Ok(ciphertext) => {
                self.encrypted_pin = ciphertext;
                Ok(())
            }
            Err(e) => {
                self.encrypted_pin.clear();
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at
            .map(|expiry| expiry - Utc::now())
            .unwrap_or_else(Duration::zero)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}
