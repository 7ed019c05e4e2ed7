//! SQLite persistence for the apiario local store.
//!
//! One Diesel table per entity, plus the sync outbox and the persisted
//! engine state. Reads go through an r2d2 pool; every mutation runs on the
//! single-writer actor inside an immediate transaction.

pub mod apiaries;
pub mod db;
pub mod errors;
pub mod hives;
pub mod inspections;
pub mod schema;
pub mod sync;

pub use db::{create_pool, get_connection, DbPool, WriteHandle, MIGRATIONS};
pub use errors::StorageError;
