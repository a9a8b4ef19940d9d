//! Auth action handlers.

mod sign_in;
mod sign_out;

pub use sign_in::{SignInCommand, SignInHandler, SignInOutcome, SIGN_IN_FAILED_TITLE};
pub use sign_out::SignOutHandler;
