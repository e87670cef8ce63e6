use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "readycash";

/// Keychain entry suffix for the agent PIN
const PIN_ENTRY_SUFFIX: &str = ":pin";

/// Password and PIN for one agent account.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub password: String,
    pub pin: String,
}

/// OS keychain storage for agent secrets.
pub struct AccountSecrets;

impl AccountSecrets {
    /// Store password and PIN for a username in the OS keychain
    pub fn store(username: &str, secrets: &Secrets) -> Result<()> {
        Self::password_entry(username)?
            .set_password(&secrets.password)
            .context("Failed to store password in keychain")?;
        Self::pin_entry(username)?
            .set_password(&secrets.pin)
            .context("Failed to store PIN in keychain")?;
        Ok(())
    }

    /// Retrieve password and PIN for a username from the OS keychain
    pub fn load(username: &str) -> Result<Secrets> {
        let password = Self::password_entry(username)?
            .get_password()
            .context("Failed to retrieve password from keychain")?;
        let pin = Self::pin_entry(username)?
            .get_password()
            .context("Failed to retrieve PIN from keychain")?;
        Ok(Secrets { password, pin })
    }

    /// Delete stored secrets for a username
    pub fn delete(username: &str) -> Result<()> {
        Self::password_entry(username)?
            .delete_credential()
            .context("Failed to delete password from keychain")?;
        Self::pin_entry(username)?
            .delete_credential()
            .context("Failed to delete PIN from keychain")?;
        Ok(())
    }

    fn password_entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")
    }

    fn pin_entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &format!("{}{}", username, PIN_ENTRY_SUFFIX))
            .context("Failed to create keyring entry")
    }
}
