use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use error_stack::Report;

use super::{AuthError, Principal};

/// Resolves the user behind an API key.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the user that owns `api_key`, if any
    async fn get_user_by_api_key(&self, api_key: &str)
        -> Result<Option<Principal>, Report<AuthError>>;
}

/// A [UserDirectory] that keeps its users in memory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, Principal>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user under an API key, replacing any user previously using the key.
    pub fn add(&self, api_key: impl Into<String>, user: Principal) {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.insert(api_key.into(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Principal>, Report<AuthError>> {
        let users = self
            .users
            .lock()
            .map_err(|_| Report::new(AuthError::Lookup))?;
        Ok(users.get(api_key).cloned())
    }
}
