//! Listener bookkeeping shared by the identity provider adapters.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::SubscriptionId;
use crate::domain::session::{AuthChangeEvent, Session};
use crate::ports::{AuthStateListener, AuthSubscription};

type Entry = (SubscriptionId, Arc<dyn AuthStateListener>);

/// Registered auth-state listeners.
///
/// Notification clones the listener list and releases the lock before
/// calling out, so a listener may (un)register without deadlocking.
#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. The subscription's hook holds only a weak reference,
    /// so a dropped provider does not outlive its subscriptions.
    pub(crate) fn register(&self, listener: Arc<dyn AuthStateListener>) -> AuthSubscription {
        let id = SubscriptionId::new();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));

        let entries = Arc::downgrade(&self.entries);
        AuthSubscription::new(id, move || {
            if let Some(entries) = entries.upgrade() {
                entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(entry_id, _)| *entry_id != id);
                tracing::debug!(subscription_id = %id, "Auth listener removed");
            }
        })
    }

    /// Delivers a change to every registered listener.
    pub(crate) fn notify(&self, event: AuthChangeEvent, session: Option<Session>) {
        let listeners: Vec<Arc<dyn AuthStateListener>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::debug!(%event, listeners = listeners.len(), "Dispatching auth state change");
        for listener in listeners {
            listener.on_auth_state_change(event, session.clone());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
