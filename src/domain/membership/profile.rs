//! Member profile record.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::expiry::{time_until_expiry, ExpiryCountdown};

/// Per-user metadata kept by the data store, one-to-one with an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Empty when the store holds no address for the member.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    /// End of the member's paid login window. Absent for profiles that were
    /// provisioned without one.
    #[serde(default)]
    pub login_expires_at: Option<Timestamp>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Profile {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            login_expires_at: None,
        }
    }

    pub fn with_login_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.login_expires_at = Some(expires_at);
        self
    }

    /// Countdown to `login_expires_at`, or `None` if the profile has none.
    pub fn time_until_expiry(&self, now: &Timestamp) -> Option<ExpiryCountdown> {
        time_until_expiry(self.login_expires_at.as_ref(), now)
    }
}
