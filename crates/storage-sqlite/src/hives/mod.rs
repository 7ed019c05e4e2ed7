//! SQLite persistence for hives.

mod model;
mod repository;

pub use model::HiveDB;
pub use repository::HiveRepository;
