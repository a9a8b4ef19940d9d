//! Session state machine: store, loader, and the manager that wires them to
//! the identity provider.

mod loader;
mod manager;
mod store;

pub use loader::ProfileLoader;
pub use manager::{SessionDeps, SessionManager};
pub use store::{LoadTicket, SessionSnapshot, SessionStore, StaleUpdate};
