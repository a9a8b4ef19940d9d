//! Application layer - Handlers and the session manager.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers perform the side-effecting auth actions; the session module owns
//! the client-side state they feed.

pub mod handlers;
pub mod session;

pub use handlers::{SignInCommand, SignInHandler, SignInOutcome, SignOutHandler};
pub use session::{SessionDeps, SessionManager, SessionSnapshot};
