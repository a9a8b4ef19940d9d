//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the session core and the outside world. Adapters implement these ports.
//!
//! - `IdentityProvider` - sign-in/out and pushed auth state changes
//! - `ProfileReader` - member profile and product ownership reads
//! - `Notifier` - user-facing notices
//! - `Clock` - current time

mod clock;
mod identity_provider;
mod notifier;
mod profile_reader;

pub use clock::{Clock, SystemClock};
pub use identity_provider::{AuthStateListener, AuthSubscription, IdentityProvider};
pub use notifier::{Notice, NoticeSeverity, Notifier};
pub use profile_reader::ProfileReader;
