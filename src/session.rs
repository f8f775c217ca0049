#![forbid(unsafe_code)]

use sha2::{Digest as _, Sha256};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::FocusworkError;

pub const TOKEN_ENV_VAR: &str = "FOCUSWORK_SESSION_TOKEN";

/// Opaque session identity. Unrelated to the human-readable profile names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues the current session identity and notifies observers when it
/// changes. Sign-in failures are non-fatal: the session simply stays
/// absent and the caller decides what to block on.
#[derive(Debug)]
pub struct SessionManager {
    tx: watch::Sender<Option<SessionId>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Signs in. With a token, the session id is a stable fingerprint of
    /// it; without one, an anonymous random identity is issued. A blank
    /// token is an authentication failure.
    pub fn begin(&self, token: Option<&str>) -> Result<SessionId, FocusworkError> {
        let id = match token {
            Some(token) => {
                let token = token.trim();
                if token.is_empty() {
                    return Err(FocusworkError::Auth("session token is blank".to_owned()));
                }
                let digest = Sha256::digest(token.as_bytes());
                let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
                SessionId(hex.chars().take(32).collect())
            }
            None => SessionId(Uuid::new_v4().simple().to_string()),
        };
        let _ = self.tx.send(Some(id.clone()));
        Ok(id)
    }

    #[must_use]
    pub fn current(&self) -> Option<SessionId> {
        self.tx.borrow().clone()
    }

    /// Delivers the current identity (or its absence) immediately, then on
    /// every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionId>> {
        self.tx.subscribe()
    }

    pub fn clear(&self) {
        let _ = self.tx.send(None);
    }
}

/// Token from the environment, falling back to the configured one. Empty
/// strings mean "no token", so plain anonymous sign-in still works with an
/// unset config key.
#[must_use]
pub fn resolve_token(configured: &str) -> Option<String> {
    if let Ok(v) = std::env::var(TOKEN_ENV_VAR)
        && !v.is_empty()
    {
        return Some(v);
    }
    if configured.is_empty() {
        None
    } else {
        Some(configured.to_owned())
    }
}
