//! Profile reader port (remote data store, read side).
//!
//! Record-oriented reads keyed by user id. A profile that has not been
//! provisioned yet is a normal outcome (`Ok(None)`), not an error.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::membership::{ProductEntitlement, Profile};

/// Reads member profiles and product ownership from the data store.
///
/// # Contract
///
/// Implementations must:
/// - Return `Ok(None)` when no profile row exists for the user
/// - Return an empty vector when the user owns no products
/// - Return `Err` only for genuine failures (network, database, decoding)
#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Loads the profile row for `user_id`.
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError>;

    /// Loads every product ownership record for `user_id`.
    async fn load_entitlements(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProductEntitlement>, DomainError>;
}
