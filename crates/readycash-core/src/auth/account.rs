use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default session lifetime requested at login (one hour).
pub const DEFAULT_SESSION_LENGTH: Duration = Duration::from_secs(3600);

/// Agent credentials. Immutable for the life of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub pin: String,
    pub session_length: Duration,
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            pin: pin.into(),
            session_length: DEFAULT_SESSION_LENGTH,
        }
    }

    pub fn with_session_length(mut self, session_length: Duration) -> Self {
        self.session_length = session_length;
        self
    }

    /// Session length as sent to the gateway, in whole seconds.
    pub fn session_length_secs(&self) -> u64 {
        self.session_length.as_secs()
    }

    /// Reject accounts that cannot log in before any request is made.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("user name", self.username.as_str()),
            ("password", self.password.as_str()),
            ("PIN", self.pin.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "account credentials are required (missing {})",
                missing.join(", ")
            )));
        }
        if self.session_length_secs() == 0 {
            return Err(Error::Configuration(
                "session length must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("pin", &"<redacted>")
            .field("session_length", &self.session_length)
            .finish()
    }
}
