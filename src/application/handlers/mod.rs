//! Command handlers.
//!
//! - `auth` - Sign-in and sign-out against the identity provider

pub mod auth;

pub use auth::{SignInCommand, SignInHandler, SignInOutcome, SignOutHandler, SIGN_IN_FAILED_TITLE};
