//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the session core to external systems:
//! - `identity` - Identity providers (GoTrue over HTTP, in-memory)
//! - `profile` - Profile and entitlement readers (PostgREST, PostgreSQL, in-memory)
//! - `notify` - Notice sinks
//! - `clock` - Controllable clock for tests

pub mod clock;
pub mod identity;
pub mod notify;
pub mod profile;

pub use clock::FixedClock;
pub use identity::{GoTrueConfig, GoTrueIdentityProvider, InMemoryIdentityProvider};
pub use notify::{RecordingNotifier, TracingNotifier};
pub use profile::{InMemoryProfileReader, PgProfileReader, PostgrestConfig, PostgrestProfileReader};
