//! Identity provider port.
//!
//! The identity provider owns credentials and session issuance. This crate
//! treats it as a black box with four capabilities:
//!
//! - push notifications of auth state changes (`on_auth_state_change`)
//! - a one-shot read of the session it currently holds (`current_session`)
//! - password sign-in
//! - sign-out
//!
//! # Listener contract
//!
//! Providers may invoke a listener synchronously from inside
//! `on_auth_state_change` (most SDKs deliver `InitialSession` that way) and
//! from inside `sign_in_with_password` / `sign_out`. Listeners must therefore
//! never call back into the provider and never block.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, SubscriptionId};
use crate::domain::session::{AuthChangeEvent, Session};

/// Receives auth state changes pushed by the identity provider.
pub trait AuthStateListener: Send + Sync {
    /// Called with the kind of change and the complete new session.
    fn on_auth_state_change(&self, event: AuthChangeEvent, session: Option<Session>);
}

/// Port to the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a listener for auth state changes.
    ///
    /// The listener stays registered until the returned subscription is
    /// unsubscribed.
    fn on_auth_state_change(&self, listener: Arc<dyn AuthStateListener>) -> AuthSubscription;

    /// Returns the session the provider currently holds, if any.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Verifies credentials and establishes a session.
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - credentials accepted
    /// * `Err(AuthError::InvalidCredentials)` - rejected, with the provider's message
    /// * `Err(AuthError::ServiceUnavailable)` - provider unreachable
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    /// Invalidates the current session on the provider side.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Handle to a registered [`AuthStateListener`].
///
/// `unsubscribe` runs the provider's removal hook at most once; later calls
/// are no-ops.
pub struct AuthSubscription {
    id: SubscriptionId,
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl AuthSubscription {
    pub fn new(id: SubscriptionId, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the listener. Returns `true` only for the call that actually
    /// removed it.
    pub fn unsubscribe(&self) -> bool {
        let hook = match self.unsubscribe.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        match self.unsubscribe.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
