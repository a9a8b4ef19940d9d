//! Session domain - who is signed in, and where the lifecycle stands.

mod events;
mod identity;
mod status;

pub use events::AuthChangeEvent;
pub use identity::{Credential, Identity, Session};
pub use status::SessionStatus;
