//! Profile reader adapters
//!
//! - `in_memory` - Test/development reader with scripted rows
//! - `postgrest` - Supabase REST API over HTTP
//! - `postgres_reader` - Direct PostgreSQL access

mod in_memory;
mod postgres_reader;
mod postgrest;
mod rows;

pub use in_memory::InMemoryProfileReader;
pub use postgres_reader::PgProfileReader;
pub use postgrest::{PostgrestConfig, PostgrestProfileReader};
