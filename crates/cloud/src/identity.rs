//! Session-token identity provider.
//!
//! The authentication handshake happens in the external identity service;
//! the shell hands the resulting session to `set_session`, and the sync
//! engine observes it through the `IdentityProvider` contract.

use tokio::sync::watch;

use apiario_core::identity::{Identity, IdentityProvider};

pub struct TokenIdentityProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl TokenIdentityProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        TokenIdentityProvider { tx }
    }

    /// Replace the current session; `None` signs out.
    pub fn set_session(&self, identity: Option<Identity>) {
        self.tx.send_replace(identity);
    }
}

impl Default for TokenIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_changes_wake_watchers() {
        let provider = TokenIdentityProvider::new();
        assert!(provider.current_identity().is_none());

        let mut rx = provider.watch();
        provider.set_session(Some(Identity {
            user_id: "beekeeper-1".to_string(),
            access_token: "token".to_string(),
        }));

        rx.changed().await.unwrap();
        assert_eq!(
            provider.current_identity().unwrap().user_id,
            "beekeeper-1"
        );

        provider.set_session(None);
        rx.changed().await.unwrap();
        assert!(provider.current_identity().is_none());
    }
}
