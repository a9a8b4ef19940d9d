//! Session store - the single source of session state.
//!
//! State lives in a `watch` channel. Every transition is one `send_modify`
//! (or `send_if_modified`), so readers never see a session without its
//! matching profile/entitlement reset.

use tokio::sync::watch;

use crate::domain::foundation::{StateMachine, Timestamp, UserId};
use crate::domain::membership::{EntitlementSet, ExpiryCountdown, Profile};
use crate::domain::session::{Session, SessionStatus};

/// Point-in-time view of everything the presentation layer reads.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub entitlements: EntitlementSet,
    /// Bumped on every identity change (including to none).
    epoch: u64,
    /// Both member-data fetches for the current identity have settled.
    member_data_loaded: bool,
    /// Bumped on every authoritative session update.
    sequence: u64,
}

impl SessionSnapshot {
    /// True until the first resolution of the session.
    pub fn is_loading(&self) -> bool {
        !self.status.is_resolved()
    }

    /// True once profile and entitlement fetches for the signed-in user
    /// have finished, whatever they returned. Always false when signed out.
    pub fn is_member_data_loaded(&self) -> bool {
        self.member_data_loaded
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(Session::user_id)
    }

    pub fn has_entitlement(&self, product_key: &str) -> bool {
        self.entitlements.contains(product_key)
    }

    pub fn time_until_expiry(&self, now: &Timestamp) -> Option<ExpiryCountdown> {
        self.profile
            .as_ref()
            .and_then(|profile| profile.time_until_expiry(now))
    }
}

/// Identity a profile/entitlement load was issued for.
///
/// Results are only applied while the store is still on the same epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub user_id: UserId,
    epoch: u64,
}

/// Owner of the session state channel.
#[derive(Debug)]
pub struct SessionStore {
    state: watch::Sender<SessionSnapshot>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { state }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&SessionSnapshot) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Current update sequence, captured by fetches that must not clobber
    /// newer pushes.
    pub fn sequence(&self) -> u64 {
        self.state.borrow().sequence
    }

    /// Replaces the session wholesale.
    ///
    /// Returns a ticket when the identity changed to a signed-in user and
    /// that user's data should be loaded.
    pub fn apply_session(&self, session: Option<Session>) -> Option<LoadTicket> {
        let mut ticket = None;
        self.state.send_modify(|state| {
            state.sequence += 1;
            ticket = replace_session(state, session);
        });
        ticket
    }

    /// Applies the result of the initial session fetch, unless an
    /// authoritative update landed after `observed_sequence` was read.
    ///
    /// Returns `Err(StaleUpdate)` when the result was dropped.
    pub fn apply_initial_session(
        &self,
        observed_sequence: u64,
        session: Option<Session>,
    ) -> Result<Option<LoadTicket>, StaleUpdate> {
        let mut outcome = Err(StaleUpdate);
        self.state.send_if_modified(|state| {
            if state.sequence != observed_sequence {
                return false;
            }
            outcome = Ok(replace_session(state, session));
            true
        });
        outcome
    }

    /// Stores a loaded profile. Returns false if the ticket is stale.
    pub fn apply_profile(&self, ticket: &LoadTicket, profile: Profile) -> bool {
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch {
                return false;
            }
            state.profile = Some(profile);
            true
        })
    }

    /// Stores a loaded entitlement set. Returns false if the ticket is stale.
    pub fn apply_entitlements(&self, ticket: &LoadTicket, entitlements: EntitlementSet) -> bool {
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch {
                return false;
            }
            state.entitlements = entitlements;
            true
        })
    }

    /// Marks the ticket's member data as settled. Returns false if the
    /// ticket is stale.
    pub fn finish_load(&self, ticket: &LoadTicket) -> bool {
        self.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch || state.member_data_loaded {
                return false;
            }
            state.member_data_loaded = true;
            true
        })
    }
}

/// Marker for an update that lost the race against a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleUpdate;

fn replace_session(state: &mut SessionSnapshot, session: Option<Session>) -> Option<LoadTicket> {
    let previous = state.user_id().cloned();
    let next = session.as_ref().map(|s| s.user_id().clone());

    state.session = session;
    state.status = advance(state.status, next.is_some());

    if previous == next {
        return None;
    }

    state.epoch += 1;
    state.member_data_loaded = false;
    state.profile = None;
    state.entitlements = EntitlementSet::new();

    next.map(|user_id| LoadTicket {
        user_id,
        epoch: state.epoch,
    })
}

fn advance(current: SessionStatus, has_session: bool) -> SessionStatus {
    let target = SessionStatus::from_presence(has_session);
    if current == target {
        return current;
    }
    match current.transition_to(target) {
        Ok(next) => next,
        Err(e) => {
            tracing::warn!(from = %current, to = %target, "Rejected status change: {}", e);
            current
        }
    }
}
