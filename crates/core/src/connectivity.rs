//! Connectivity signal contract.

use tokio::sync::watch;

/// Online/offline state plus change notifications, fed by the platform shell.
pub trait ConnectivitySignal: Send + Sync {
    fn is_online(&self) -> bool;

    /// Receiver that wakes on every online/offline transition.
    fn watch(&self) -> watch::Receiver<bool>;
}
