//! Core domain for the apiario offline-first record keeper.
//!
//! This crate owns the domain models (apiaries, hives, inspections), the
//! repository and service contracts, the error taxonomy, and the sync
//! engine. Storage and network backends live in sibling crates and plug in
//! through the traits defined here.

pub mod apiaries;
pub mod connectivity;
pub mod errors;
pub mod hives;
pub mod identity;
pub mod inspections;
pub mod remote;
pub mod sync;

pub use errors::{Error, Result};
