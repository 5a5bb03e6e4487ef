//! Bearer credentials for remote drive access.
//!
//! Acquiring a credential may involve an interactive flow; the core only sees
//! the [`TokenProvider`] trait and an opaque [`AccessToken`].

use std::fmt;
use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No drive credential is available. Run `tabsync auth login` or set TABSYNC_DRIVE_TOKEN.")]
    NotSignedIn,
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> AuthResult<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(AuthError::NotSignedIn);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken([REDACTED])")
    }
}

/// Source of bearer credentials.
pub trait TokenProvider: Send + Sync + 'static {
    fn access_token(&self) -> impl Future<Output = AuthResult<AccessToken>> + Send;
}

/// Provider returning a fixed, already-acquired token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StaticTokenProvider")
            .field("token", &self.token)
            .finish()
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> AuthResult<AccessToken> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_rejects_blank() {
        assert!(matches!(AccessToken::new("  "), Err(AuthError::NotSignedIn)));
    }

    #[test]
    fn access_token_debug_redacts_secret() {
        let token = AccessToken::new(" ya29.secret ").unwrap();
        assert_eq!(token.secret(), "ya29.secret");
        let rendered = format!("{:?}", StaticTokenProvider::new(token));
        assert!(!rendered.contains("ya29.secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new(AccessToken::new("abc").unwrap());
        assert_eq!(provider.access_token().await.unwrap().secret(), "abc");
    }
}
