#![forbid(unsafe_code)]
//! SQLite-backed persistence for the job queue: jobs, configuration, and
//! worker registrations, with the atomic claim protocol that lets multiple
//! worker processes dequeue without races.

mod store;

pub use store::SqliteStore;
pub use store::error::StoreError;
pub use store::types::*;
