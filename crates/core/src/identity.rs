//! Identity provider contract.
//!
//! The authentication protocol lives in an external identity service; the
//! core only consumes the resulting session. No identity means sync is
//! disabled, not broken.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// An authenticated session, as handed over by the external identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Owner id stamped on records created under this session
    pub user_id: String,
    /// Bearer token forwarded to the remote table service
    pub access_token: String,
}

/// Source of the current session plus change notifications.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    /// Receiver that wakes whenever the session is set or cleared.
    fn watch(&self) -> watch::Receiver<Option<Identity>>;
}
