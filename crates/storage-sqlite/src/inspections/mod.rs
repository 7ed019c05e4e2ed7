//! SQLite persistence for inspections.

mod model;
mod repository;

pub use model::InspectionDB;
pub use repository::InspectionRepository;
