// SPDX-License-Identifier: Apache-2.0

//! Login provider seam and in-process sessions.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use shimekiri_model::{ExternalIdentity, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct AuthError(pub String);

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for AuthError {}

/// The external social-login provider, reduced to the one thing the
/// application needs from it: who just authenticated. The OAuth handshake
/// itself lives behind this seam.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn fetch_identity(&self) -> Result<ExternalIdentity, AuthError>;
}

/// Settable provider double, also used as the development login backend.
pub struct FakeIdentityProvider {
    identity: Mutex<ExternalIdentity>,
}

impl FakeIdentityProvider {
    #[must_use]
    pub fn new(identity: ExternalIdentity) -> Self {
        Self {
            identity: Mutex::new(identity),
        }
    }

    pub async fn set_identity(&self, identity: ExternalIdentity) {
        *self.identity.lock().await = identity;
    }
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new(ExternalIdentity {
            provider_id: "1111111".to_string(),
            nickname: "test".to_string(),
            name: "testuser".to_string(),
            avatar_url: "https://avatars.example/285/abott.png".to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn fetch_identity(&self) -> Result<ExternalIdentity, AuthError> {
        Ok(self.identity.lock().await.clone())
    }
}

/// Opaque-token session table. Tokens die with the process.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, UserId>>,
    seed: AtomicU64,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            seed: AtomicU64::new(1),
        }
    }

    pub async fn open_session(&self, user: UserId) -> String {
        let n = self.seed.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let mut hasher = Sha256::new();
        hasher.update(n.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update(user.as_i64().to_le_bytes());
        let token = format!("{:x}", hasher.finalize());
        self.sessions.lock().await.insert(token.clone(), user);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.lock().await.get(token).copied()
    }

    pub async fn close_session(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
