//! Identity provider adapters.
//!
//! Implementations of the `IdentityProvider` port:
//!
//! - `in_memory` - Test/development provider with scripted accounts
//! - `gotrue` - Supabase Auth (GoTrue) over HTTP

mod gotrue;
mod in_memory;
mod listeners;

pub use gotrue::{GoTrueConfig, GoTrueIdentityProvider};
pub use in_memory::{InMemoryIdentityProvider, INVALID_LOGIN_MESSAGE};
