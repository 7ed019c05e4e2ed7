//! Inspection domain: model, repository contract, and service facade.
//!
//! Inspections are immutable once created; there is no update path.

mod model;
mod service;

pub use model::*;
pub use service::*;
