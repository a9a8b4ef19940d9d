//! Identity and Session value objects.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// The authenticated user's stable id/email pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
}

impl Identity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Opaque bearer credential issued by the identity provider.
///
/// Cheap to clone; `Debug` never prints the token.
#[derive(Clone)]
pub struct Credential(Arc<SecretString>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::new(token.into())))
    }

    /// Exposes the raw token (for building request headers).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// A time-bounded authorization tied to an [`Identity`].
///
/// Sessions are replaced wholesale on every provider notification; nothing
/// mutates one in place.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub access_token: Credential,
    pub refresh_token: Option<Credential>,
    /// Provider-defined end of the credential's lifetime, if reported.
    pub expires_at: Option<Timestamp>,
}

impl Session {
    pub fn new(identity: Identity, access_token: Credential) -> Self {
        Self {
            identity,
            access_token,
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, token: Credential) -> Self {
        self.refresh_token = Some(token);
        self
    }

    pub fn with_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.identity.id
    }

    /// True if the provider-reported lifetime has elapsed at `now`.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_at
            .map(|expires_at| !expires_at.is_after(now))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(UserId::new("user-1").unwrap(), "ana@example.com")
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret-jwt");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("super-secret-jwt"));
        assert_eq!(credential.expose(), "super-secret-jwt");
    }

    #[test]
    fn session_debug_does_not_leak_tokens() {
        let session = Session::new(identity(), Credential::new("access-123"))
            .with_refresh_token(Credential::new("refresh-456"));
        let printed = format!("{:?}", session);
        assert!(!printed.contains("access-123"));
        assert!(!printed.contains("refresh-456"));
    }

    #[test]
    fn session_without_expiry_never_expires() {
        let session = Session::new(identity(), Credential::new("t"));
        assert!(!session.is_expired_at(&Timestamp::now()));
    }

    #[test]
    fn session_expires_at_reported_time() {
        let now = Timestamp::now();
        let session = Session::new(identity(), Credential::new("t")).with_expires_at(now);
        assert!(session.is_expired_at(&now));
        assert!(!session.is_expired_at(&now.minus_secs(1)));
    }
}
