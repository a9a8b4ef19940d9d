//! Membership domain - profile data and product entitlements.
//!
//! Everything here is pure: no I/O, no clock reads. Callers pass `now` in.

mod entitlement;
mod expiry;
mod profile;

pub use entitlement::{EntitlementSet, ProductEntitlement, ProductKey};
pub use expiry::{time_until_expiry, ExpiryCountdown, EXPIRED_LABEL};
pub use profile::Profile;
