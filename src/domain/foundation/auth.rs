//! Authentication errors for the domain layer.
//!
//! These are **domain-centric**: any identity provider (Supabase GoTrue,
//! an in-memory test double, ...) maps its failures onto them, so callers
//! never see provider-specific error shapes.

use thiserror::Error;

/// Errors returned by the identity provider port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The provider rejected the email/password pair. Carries the
    /// provider's own message so it can be shown to the user verbatim.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An operation that needs a session was called without one.
    #[error("No active session")]
    SessionMissing,

    /// The provider could not be reached (network, timeout, 5xx).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The provider answered with something we could not interpret.
    #[error("Unexpected auth response: {0}")]
    UnexpectedResponse(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Creates an invalid credentials error with the provider's message.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials(message.into())
    }

    /// Text suitable for showing to the person who tried to sign in.
    ///
    /// Credential rejections surface the provider's message untouched.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_user_message_is_provider_text() {
        let err = AuthError::invalid_credentials("Invalid login credentials");
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn service_unavailable_displays_message() {
        let err = AuthError::service_unavailable("Connection refused");
        assert_eq!(
            format!("{}", err),
            "Auth service unavailable: Connection refused"
        );
        assert_eq!(err.user_message(), "Auth service unavailable: Connection refused");
    }

    #[test]
    fn is_transient_only_for_service_errors() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(!AuthError::invalid_credentials("nope").is_transient());
        assert!(!AuthError::SessionMissing.is_transient());
    }
}
