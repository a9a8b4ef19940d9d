//! SignOutHandler - Command handler for provider-side sign-out.

use std::sync::Arc;

use crate::domain::foundation::AuthError;
use crate::ports::IdentityProvider;

/// Handler for sign-out.
///
/// Only talks to the provider. Callers reset local state whatever this
/// returns.
pub struct SignOutHandler {
    identity: Arc<dyn IdentityProvider>,
}

impl SignOutHandler {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub async fn handle(&self) -> Result<(), AuthError> {
        match self.identity.sign_out().await {
            Ok(()) => {
                tracing::info!("Signed out");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider sign-out failed; clearing local session anyway");
                Err(e)
            }
        }
    }
}
