// ─── Authentication ───
// Who the game is launched as. Account flows live behind `Authenticator`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::SyncResult;

const DEFAULT_USERNAME: &str = "Player";
const OFFLINE_TOKEN: &str = "offline_access_token";

/// Identity handed to the launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
    pub display_name: String,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> SyncResult<AuthSession>;
}

/// Local play without an account service.
#[derive(Debug, Clone)]
pub struct OfflineAuthenticator {
    username: String,
}

impl OfflineAuthenticator {
    pub fn new(username: &str) -> Self {
        let trimmed = username.trim();
        let username = if trimmed.is_empty() {
            DEFAULT_USERNAME
        } else {
            trimmed
        };
        Self {
            username: username.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Default for OfflineAuthenticator {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME)
    }
}

#[async_trait]
impl Authenticator for OfflineAuthenticator {
    async fn authenticate(&self) -> SyncResult<AuthSession> {
        Ok(AuthSession {
            user_id: Uuid::nil().to_string(),
            token: OFFLINE_TOKEN.to_string(),
            display_name: self.username.clone(),
        })
    }
}
