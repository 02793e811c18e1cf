use log::debug;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::auth::SessionToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub name: String,
}

/// Live sessions, oldest first.
#[derive(Default)]
pub struct Sessions {
    entries: RwLock<Vec<(SessionToken, SessionUser)>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, username: &str, name: &str) -> SessionToken {
        let token = SessionToken::new();
        let user = SessionUser {
            username: username.into(),
            name: name.into(),
        };

        let mut entries = self.entries.write().await;
        entries.push((token.clone(), user));
        debug!("{username}: session {token} created, {} live", entries.len());

        token
    }

    pub async fn resolve(&self, token: &SessionToken) -> Option<SessionUser> {
        self.entries
            .read()
            .await
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, user)| user.clone())
    }

    /// Drops the oldest session belonging to `username`.
    /// Returns whether one was found.
    pub async fn revoke(&self, username: &str) -> bool {
        let mut entries = self.entries.write().await;

        match entries.iter().position(|(_, user)| user.username == username) {
            Some(i) => {
                let (token, _) = entries.remove(i);
                debug!("{username}: session {token} revoked");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
