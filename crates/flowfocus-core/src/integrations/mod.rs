pub mod google;
pub mod traits;

pub use google::GoogleCalendar;
pub use traits::CalendarProvider;

/// Environment variable that overrides the stored Google access token.
pub const GOOGLE_TOKEN_ENV: &str = "FLOWFOCUS_GOOGLE_TOKEN";

/// Keyring entry holding the Google access token.
pub const GOOGLE_TOKEN_KEY: &str = "google_access_token";

/// Where a Google access token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keyring,
}

/// Look up the Google access token, preferring `$FLOWFOCUS_GOOGLE_TOKEN`.
pub fn google_token() -> crate::Result<Option<(String, TokenSource)>> {
    if let Ok(token) = std::env::var(GOOGLE_TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(Some((token, TokenSource::Environment)));
        }
    }
    Ok(keyring_store::get(GOOGLE_TOKEN_KEY)?.map(|t| (t, TokenSource::Keyring)))
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "flowfocus";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
