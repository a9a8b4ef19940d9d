//! Auth state change notifications pushed by the identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change the identity provider is announcing.
///
/// Every notification carries the complete new session (or none); the kind
/// is informational and used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// Delivered once when a listener registers, with whatever session the
    /// provider currently holds.
    InitialSession,
    SignedIn,
    /// Covers both explicit sign-out and provider-side expiry.
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthChangeEvent {
    /// Wire name, matching the provider SDK's event strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthChangeEvent::InitialSession => "INITIAL_SESSION",
            AuthChangeEvent::SignedIn => "SIGNED_IN",
            AuthChangeEvent::SignedOut => "SIGNED_OUT",
            AuthChangeEvent::TokenRefreshed => "TOKEN_REFRESHED",
            AuthChangeEvent::UserUpdated => "USER_UPDATED",
        }
    }
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
