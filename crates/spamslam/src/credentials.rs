//! Access token storage in the system keyring.
//!
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "spamslam";

/// Credential type identifier for Gmail access tokens.
const ACCESS_TOKEN_CREDENTIAL: &str = "gmail_token";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Keyring entry key for an account's credential.
fn credential_key(email: &str, credential_type: &str) -> String {
    format!("{SERVICE_NAME}_{credential_type}_{}", email.to_lowercase())
}

fn token_entry(email: &str) -> CredentialResult<Entry> {
    let key = credential_key(email, ACCESS_TOKEN_CREDENTIAL);
    Ok(Entry::new(SERVICE_NAME, &key)?)
}

/// Stores the access token for an account.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_access_token(email: &str, token: &str) -> CredentialResult<()> {
    token_entry(email)?.set_password(token)?;
    debug!(%email, "Stored access token");
    Ok(())
}

/// Retrieves the access token for an account.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_access_token(email: &str) -> CredentialResult<Option<String>> {
    match token_entry(email)?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => {
            debug!(%email, "No access token found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the access token for an account. Returns `true` if one existed.
///
/// # Errors
///
/// Returns an error if the keyring operation fails (except for a missing
/// entry).
pub fn delete_access_token(email: &str) -> CredentialResult<bool> {
    match token_entry(email)?.delete_credential() {
        Ok(()) => {
            debug!(%email, "Deleted access token");
            Ok(true)
        }
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_key_format() {
        assert_eq!(
            credential_key("Me@Gmail.com", ACCESS_TOKEN_CREDENTIAL),
            "spamslam_gmail_token_me@gmail.com"
        );
    }

    #[test]
    fn test_credential_keys_differ_per_account() {
        assert_ne!(
            credential_key("a@gmail.com", ACCESS_TOKEN_CREDENTIAL),
            credential_key("b@gmail.com", ACCESS_TOKEN_CREDENTIAL)
        );
    }
}
