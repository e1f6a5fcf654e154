//! Credential checks and the session token store.
//!
//! This module handles:
//! - Username/password verification against a configured user table
//! - Session token issuance on login
//! - Token invalidation on logout
//!
//! A session token is an opaque string bound to the user it was issued to.
//! Logging out a token that is already invalid is an accepted no-op; callers
//! that need to distinguish "never existed" from "no longer bound" should use
//! [`AuthManager::get_user`], which returns `None` for both.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use uuid::Uuid;

use crate::{CoreError, CoreResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Verifies credentials and tracks live session tokens.
pub struct AuthManager {
    /// Configured users, username to password.
    users: HashMap<String, String>,

    /// Live sessions, token to the bound username.
    sessions: RwLock<HashMap<String, String>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AuthManager {
    /// Create an auth manager over the given username/password table.
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Verify the credentials and issue a fresh session token.
    pub fn login_with_password(&self, username: &str, password: &str) -> CoreResult<String> {
        match self.users.get(username) {
            Some(expected) if expected == password => {
                let token = Uuid::new_v4().to_string();
                self.sessions
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(token.clone(), username.to_string());
                tracing::debug!("issued session for user '{}'", username);
                Ok(token)
            }
            _ => Err(CoreError::AuthenticationFailed(username.to_string())),
        }
    }

    /// Invalidate a session token. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    /// The user a token is currently bound to, if any.
    pub fn get_user(&self, token: &str) -> Option<String> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    /// Whether the token maps to a live session.
    pub fn is_valid_session(&self, token: &str) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
