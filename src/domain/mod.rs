//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `session` - Identity, session credential, and lifecycle status
//! - `membership` - Member profile, product entitlements, expiry countdown

pub mod foundation;
pub mod membership;
pub mod session;
