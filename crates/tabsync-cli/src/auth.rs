//! Drive access tokens with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

pub use tabsync_core::auth::{AccessToken, AuthError, AuthResult, TokenProvider};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "tabsync-cli";

/// Env override taking precedence over the keychain.
pub const DRIVE_TOKEN_ENV: &str = "TABSYNC_DRIVE_TOKEN";

#[derive(Clone)]
struct TokenStore {
    username: String,
}

impl TokenStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("drive_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(not(test))]
    fn load(&self) -> AuthResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load(&self) -> AuthResult<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    fn save(&self, raw: &str) -> AuthResult<()> {
        self.entry()?
            .set_password(raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save(&self, raw: &str) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

pub fn load_stored_token(profile_name: &str) -> AuthResult<Option<AccessToken>> {
    TokenStore::new(profile_name)
        .load()?
        .map(AccessToken::new)
        .transpose()
}

pub fn store_token(profile_name: &str, token: &AccessToken) -> AuthResult<()> {
    TokenStore::new(profile_name).save(token.secret())
}

pub fn clear_stored_token(profile_name: &str) -> AuthResult<()> {
    TokenStore::new(profile_name).clear()
}

fn env_token() -> Option<AccessToken> {
    std::env::var(DRIVE_TOKEN_ENV)
        .ok()
        .and_then(|raw| AccessToken::new(raw).ok())
}

/// Where the token for a profile comes from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keychain,
}

pub fn resolve_token(profile_name: &str) -> AuthResult<Option<(AccessToken, TokenSource)>> {
    if let Some(token) = env_token() {
        return Ok(Some((token, TokenSource::Environment)));
    }
    Ok(load_stored_token(profile_name)?.map(|token| (token, TokenSource::Keychain)))
}

/// Token provider reading the profile's token on every request.
#[derive(Debug, Clone)]
pub struct ProfileTokenProvider {
    profile_name: String,
}

impl ProfileTokenProvider {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
        }
    }
}

impl TokenProvider for ProfileTokenProvider {
    async fn access_token(&self) -> AuthResult<AccessToken> {
        resolve_token(&self.profile_name)?
            .map(|(token, _)| token)
            .ok_or(AuthError::NotSignedIn)
    }
}
