use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::services::auth_service::AuthResponse;

/// Logged-in user as the frontend keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub token: String,
}

impl From<&AuthResponse> for SessionUser {
    fn from(response: &AuthResponse) -> Self {
        Self {
            user_id: response.user.id.clone(),
            username: response.user.username.clone(),
            email: response.user.email.clone(),
            profile_picture: response.user.profile_picture.clone(),
            token: response.token.clone(),
        }
    }
}

/// Auth state with change notification. Views subscribe instead of polling.
pub struct SessionStore {
    tx: watch::Sender<Option<SessionUser>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Restores a previously persisted session (e.g. the stored `user` JSON).
    pub fn restore(raw: &str) -> Self {
        let store = Self::new();
        match serde_json::from_str::<SessionUser>(raw) {
            Ok(user) => {
                store.tx.send_replace(Some(user));
            }
            Err(e) => log::warn!("⚠️  Ignoring unreadable stored session: {}", e),
        }
        store
    }

    pub fn login(&self, user: SessionUser) {
        log::info!("🔐 Session started for {}", user.email);
        self.tx.send_replace(Some(user));
    }

    pub fn logout(&self) {
        if self.tx.send_replace(None).is_some() {
            log::info!("👋 Session ended");
        }
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Bearer header value for API calls.
    pub fn authorization(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .map(|user| format!("Bearer {}", user.token))
    }

    /// Applies a new picture path; no-op when logged out.
    pub fn set_profile_picture(&self, path: Option<String>) {
        self.tx.send_if_modified(|session| match session {
            Some(user) if user.profile_picture != path => {
                user.profile_picture = path.clone();
                true
            }
            _ => false,
        });
    }

    /// JSON for persistence, `None` when logged out.
    pub fn to_json(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .and_then(|user| serde_json::to_string(user).ok())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }
}
