use sha2::{Digest, Sha256};

const TOKEN_SUFFIX: &str = "-auth-token";
const SESSION_ID_SUFFIX: &str = "-session-id";
const EXPIRATION_SUFFIX: &str = "-auth-expiration";
const ENCRYPTED_PIN_SUFFIX: &str = "-auth-encoded-pin";

/// Store keys for the four persisted session fields of one account.
///
/// Derived from the gateway base URL, login path and user name, so every
/// client talking to the same account on the same gateway shares a session
/// while other accounts and environments never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeySet {
    pub token: String,
    pub session_id: String,
    pub expiration: String,
    pub encrypted_pin: String,
}

impl CacheKeySet {
    pub fn derive(base_url: &str, login_path: &str, username: &str) -> Self {
        let base = namespace(base_url, login_path, username);
        Self {
            token: format!("{}{}", base, TOKEN_SUFFIX),
            session_id: format!("{}{}", base, SESSION_ID_SUFFIX),
            expiration: format!("{}{}", base, EXPIRATION_SUFFIX),
            encrypted_pin: format!("{}{}", base, ENCRYPTED_PIN_SUFFIX),
        }
    }

    pub fn all(&self) -> [&str; 4] {
        [
            &self.token,
            &self.session_id,
            &self.expiration,
            &self.encrypted_pin,
        ]
    }
}

/// SHA-256 over the length-prefixed components, hex encoded.
fn namespace(base_url: &str, login_path: &str, username: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [base_url, login_path, username] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
