//! Hive domain: model, repository contract, and service facade.

mod model;
mod service;

pub use model::*;
pub use service::*;
