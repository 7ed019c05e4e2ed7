//! Cloud-side collaborators for the apiario sync engine: the REST table
//! client, the session-token identity provider, and the connectivity
//! monitor.

mod client;
mod connectivity;
mod error;
mod identity;

pub use client::{CloudConfig, CloudTableClient};
pub use connectivity::ConnectivityMonitor;
pub use error::{CloudError, Result};
pub use identity::TokenIdentityProvider;
