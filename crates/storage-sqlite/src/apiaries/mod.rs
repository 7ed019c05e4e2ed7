//! SQLite persistence for apiaries.

mod model;
mod repository;

pub use model::ApiaryDB;
pub use repository::ApiaryRepository;
