//! In-memory profile reader for tests and local development.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::membership::{ProductEntitlement, ProductKey, Profile};
use crate::ports::ProfileReader;

/// In-memory implementation of [`ProfileReader`].
///
/// Reads can be held with [`pause`](Self::pause) to simulate slow fetches;
/// results are captured when the call starts, like a request already in
/// flight.
pub struct InMemoryProfileReader {
    profiles: RwLock<HashMap<UserId, Profile>>,
    entitlements: RwLock<HashMap<UserId, Vec<ProductEntitlement>>>,
    profile_error: RwLock<Option<DomainError>>,
    entitlements_error: RwLock<Option<DomainError>>,
    reads_open: watch::Sender<bool>,
    requests: RwLock<Vec<UserId>>,
}

impl Default for InMemoryProfileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProfileReader {
    pub fn new() -> Self {
        let (reads_open, _) = watch::channel(true);
        Self {
            profiles: RwLock::new(HashMap::new()),
            entitlements: RwLock::new(HashMap::new()),
            profile_error: RwLock::new(None),
            entitlements_error: RwLock::new(None),
            reads_open,
            requests: RwLock::new(Vec::new()),
        }
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        self.insert_profile(profile);
        self
    }

    /// Grants `keys` to `user_id`. Blank keys are ignored.
    pub fn with_entitlements(self, user_id: &UserId, keys: &[&str]) -> Self {
        let rows = keys
            .iter()
            .filter_map(|key| ProductKey::new(*key).ok())
            .map(ProductEntitlement::new)
            .collect();
        write(&self.entitlements).insert(user_id.clone(), rows);
        self
    }

    /// Makes every profile read fail with `error`.
    pub fn with_profile_error(self, error: DomainError) -> Self {
        *write(&self.profile_error) = Some(error);
        self
    }

    /// Makes every entitlement read fail with `error`.
    pub fn with_entitlements_error(self, error: DomainError) -> Self {
        *write(&self.entitlements_error) = Some(error);
        self
    }

    pub fn insert_profile(&self, profile: Profile) {
        write(&self.profiles).insert(profile.id.clone(), profile);
    }

    /// Holds every read until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.reads_open.send_replace(false);
    }

    pub fn resume(&self) {
        self.reads_open.send_replace(true);
    }

    /// User ids of every profile read, in call order.
    pub fn profile_requests(&self) -> Vec<UserId> {
        read(&self.requests).clone()
    }

    async fn wait_until_open(&self) -> Result<(), DomainError> {
        let mut open = self.reads_open.subscribe();
        open.wait_for(|open| *open)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::external(e.to_string()))
    }
}

#[async_trait]
impl ProfileReader for InMemoryProfileReader {
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        write(&self.requests).push(user_id.clone());
        let result = match read(&self.profile_error).clone() {
            Some(error) => Err(error),
            None => Ok(read(&self.profiles).get(user_id).cloned()),
        };

        self.wait_until_open().await?;
        result
    }

    async fn load_entitlements(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProductEntitlement>, DomainError> {
        let result = match read(&self.entitlements_error).clone() {
            Some(error) => Err(error),
            None => Ok(read(&self.entitlements)
                .get(user_id)
                .cloned()
                .unwrap_or_default()),
        };

        self.wait_until_open().await?;
        result
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
