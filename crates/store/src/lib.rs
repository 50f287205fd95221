//! Persistence adapters for the repository ports defined in `domain`.
//!
//! [`InMemoryStore`] backs tests and local runs without a database;
//! [`PostgresStore`] is the production adapter. Both honor the same
//! contract: the order/product changeset commits atomically, and guarded
//! transitions fail with a conflict instead of clobbering concurrent
//! writers.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
