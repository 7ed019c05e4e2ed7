//! SQLite persistence for the sync outbox and engine state.

mod model;
mod repository;

pub use model::{NewOutboxEntryDB, OutboxEntryDB, SyncEngineStateDB};
pub use repository::SyncRepository;
