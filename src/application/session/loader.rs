//! Profile loader - fetches member data for a freshly established identity.

use std::sync::Arc;

use crate::domain::membership::EntitlementSet;
use crate::ports::ProfileReader;

use super::store::{LoadTicket, SessionStore};

/// Loads profile and entitlements for one identity and applies them to the
/// store, dropping results that arrive after the identity changed.
///
/// Failures never propagate: the session stays usable with no member data.
pub struct ProfileLoader {
    reader: Arc<dyn ProfileReader>,
    store: Arc<SessionStore>,
}

impl ProfileLoader {
    pub fn new(reader: Arc<dyn ProfileReader>, store: Arc<SessionStore>) -> Self {
        Self { reader, store }
    }

    /// Runs both fetches concurrently. Each result is applied as soon as it
    /// resolves, independently of the other.
    pub async fn load(&self, ticket: LoadTicket) {
        tracing::debug!(user_id = %ticket.user_id, "Loading member data");
        tokio::join!(self.load_profile(&ticket), self.load_entitlements(&ticket));
        self.store.finish_load(&ticket);
    }

    async fn load_profile(&self, ticket: &LoadTicket) {
        match self.reader.load_profile(&ticket.user_id).await {
            Ok(Some(profile)) => {
                if !self.store.apply_profile(ticket, profile) {
                    tracing::debug!(user_id = %ticket.user_id, "Discarded profile for stale identity");
                }
            }
            Ok(None) => {
                tracing::debug!(user_id = %ticket.user_id, "No profile provisioned");
            }
            Err(e) => {
                tracing::error!(user_id = %ticket.user_id, error = %e, "Failed to load profile");
            }
        }
    }

    async fn load_entitlements(&self, ticket: &LoadTicket) {
        match self.reader.load_entitlements(&ticket.user_id).await {
            Ok(rows) => {
                let entitlements: EntitlementSet = rows.into_iter().collect();
                let count = entitlements.len();
                if self.store.apply_entitlements(ticket, entitlements) {
                    tracing::debug!(user_id = %ticket.user_id, count, "Entitlements loaded");
                } else {
                    tracing::debug!(user_id = %ticket.user_id, "Discarded entitlements for stale identity");
                }
            }
            Err(e) => {
                tracing::error!(user_id = %ticket.user_id, error = %e, "Failed to load entitlements");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::profile::InMemoryProfileReader;
    use crate::domain::foundation::{DomainError, UserId};
    use crate::domain::membership::Profile;
    use crate::domain::session::{Credential, Identity, Session};

    fn ana() -> UserId {
        UserId::new("ana").unwrap()
    }

    fn ana_session() -> Session {
        Session::new(Identity::new(ana(), "ana@example.com"), Credential::new("t"))
    }

    fn setup(reader: InMemoryProfileReader) -> (Arc<InMemoryProfileReader>, Arc<SessionStore>, ProfileLoader) {
        let reader = Arc::new(reader);
        let store = Arc::new(SessionStore::new());
        let loader = ProfileLoader::new(reader.clone(), store.clone());
        (reader, store, loader)
    }

    #[tokio::test]
    async fn loads_profile_and_entitlements_for_ticket() {
        let (_, store, loader) = setup(
            InMemoryProfileReader::new()
                .with_profile(Profile::new(ana(), "ana@example.com"))
                .with_entitlements(&ana(), &["modulo-1", "bonus"]),
        );
        let ticket = store.apply_session(Some(ana_session())).unwrap();

        loader.load(ticket).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.profile.unwrap().email, "ana@example.com");
        assert!(snapshot.entitlements.contains("modulo-1"));
        assert!(snapshot.entitlements.contains("bonus"));
    }

    #[tokio::test]
    async fn missing_profile_leaves_profile_empty_but_loads_entitlements() {
        let (_, store, loader) =
            setup(InMemoryProfileReader::new().with_entitlements(&ana(), &["modulo-1"]));
        let ticket = store.apply_session(Some(ana_session())).unwrap();

        loader.load(ticket).await;

        let snapshot = store.snapshot();
        assert!(snapshot.profile.is_none());
        assert!(snapshot.has_entitlement("modulo-1"));
        assert!(snapshot.is_member_data_loaded());
    }

    #[tokio::test]
    async fn fetch_errors_are_swallowed() {
        let (_, store, loader) = setup(
            InMemoryProfileReader::new()
                .with_profile_error(DomainError::external("timeout"))
                .with_entitlements_error(DomainError::external("timeout")),
        );
        let ticket = store.apply_session(Some(ana_session())).unwrap();

        loader.load(ticket).await;

        let snapshot = store.snapshot();
        assert!(snapshot.status.is_authenticated());
        assert!(snapshot.profile.is_none());
        assert!(snapshot.entitlements.is_empty());
        assert!(snapshot.is_member_data_loaded());
    }

    #[tokio::test]
    async fn no_products_still_finishes_loading() {
        let (_, store, loader) =
            setup(InMemoryProfileReader::new().with_profile(Profile::new(ana(), "ana@example.com")));
        let ticket = store.apply_session(Some(ana_session())).unwrap();

        loader.load(ticket).await;

        let snapshot = store.snapshot();
        assert!(snapshot.entitlements.is_empty());
        assert!(snapshot.is_member_data_loaded());
    }

    #[tokio::test]
    async fn results_for_signed_out_identity_are_discarded() {
        let (reader, store, loader) = setup(
            InMemoryProfileReader::new()
                .with_profile(Profile::new(ana(), "ana@example.com"))
                .with_entitlements(&ana(), &["modulo-1"]),
        );
        let ticket = store.apply_session(Some(ana_session())).unwrap();
        reader.pause();

        let pending = tokio::spawn(async move { loader.load(ticket).await });
        tokio::task::yield_now().await;
        store.apply_session(None);
        reader.resume();
        pending.await.unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.profile.is_none());
        assert!(snapshot.entitlements.is_empty());
        assert!(!snapshot.is_member_data_loaded());
    }
}
