//! SessionStatus enum for tracking the client's authentication lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of the client-side session.
///
/// `Unknown` holds until the first resolution (a restored session or
/// confirmation that there is none). After that the status cycles between
/// `Anonymous` and `Authenticated` for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unknown,
    Anonymous,
    Authenticated,
}

impl SessionStatus {
    /// Status implied by whether a session is present.
    pub fn from_presence(has_session: bool) -> Self {
        if has_session {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Returns true once the first resolution has happened.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionStatus::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Unknown, Anonymous)
                | (Unknown, Authenticated)
                | (Anonymous, Authenticated)
                | (Authenticated, Anonymous)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Unknown => vec![Anonymous, Authenticated],
            Anonymous => vec![Authenticated],
            Authenticated => vec![Anonymous],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Unknown => "unknown",
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Authenticated => "authenticated",
        };
        write!(f, "{}", s)
    }
}
