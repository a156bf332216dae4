//! User directory client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

use super::ClientError;

/// Identity data for one user.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: UserId,
    pub active: bool,
}

/// Client for the identity domain.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_info(&self, id: UserId) -> Result<UserInfo, ClientError>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<UserId, UserInfo>,
    unavailable: bool,
}

/// In-memory directory for wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_user(&self, id: UserId, active: bool) {
        self.state
            .write()
            .unwrap()
            .users
            .insert(id, UserInfo { id, active });
    }

    /// Makes every call fail, simulating an unreachable collaborator.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn user_info(&self, id: UserId) -> Result<UserInfo, ClientError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(ClientError::new("user directory unreachable"));
        }
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::new(format!("user {id} unknown")))
    }
}
