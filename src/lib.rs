//! Member Portal - session and entitlement state for a membership-gated
//! content portal.
//!
//! Establishes who is signed in, loads the member's profile and owned
//! products, and answers "can this member open product X" for any UI
//! consumer. Identity and data storage are delegated to external services
//! behind the ports in [`ports`].

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
