//! Configuration module for the hyperd server.
//!
//! This module handles server configuration including:
//! - Listen address
//! - The configured API users
//! - Development and production mode settings
//!
//! In production mode at least one user credential must be configured or no
//! session could ever be opened; development mode allows starting with none
//! so the unauthenticated surface (login, the identity shortcuts) can be
//! exercised.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

use getset::Getters;
use serde::Deserialize;

use crate::{ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The IP address the server binds by default.
pub const LOCALHOST_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// The port the server binds by default.
pub const DEFAULT_PORT: u16 = 9363;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One configured API user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredential {
    /// Login name.
    pub username: String,

    /// Plaintext password. Hyperd is expected to sit behind a transport
    /// that protects it.
    pub password: String,
}

/// Configuration structure that holds all the application settings.
#[derive(Debug, Deserialize, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Config {
    /// Users allowed to open sessions.
    users: Vec<UserCredential>,

    /// Whether to run the server in development mode.
    dev_mode: bool,

    /// Address to listen on.
    addr: SocketAddr,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for UserCredential {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((username, password)) if !username.is_empty() => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(format!(
                "invalid credential '{}'; expected username:password",
                s
            )),
        }
    }
}

impl Config {
    /// Create a new configuration.
    pub fn new(users: Vec<UserCredential>, port: u16, dev_mode: bool) -> ServerResult<Self> {
        if users.is_empty() && !dev_mode {
            return Err(ServerError::ConfigError(
                "No users configured. At least one user is required when not in dev mode"
                    .to_string(),
            ));
        }

        Ok(Self {
            users,
            dev_mode,
            addr: SocketAddr::new(LOCALHOST_IP, port),
        })
    }

    /// The configured users as (username, password) pairs, ready for the
    /// auth manager.
    pub fn user_table(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.users
            .iter()
            .map(|u| (u.username.clone(), u.password.clone()))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_parsing() {
        let cred: UserCredential = "admin:s3cret".parse().unwrap();
        assert_eq!(cred.username, "admin");
        assert_eq!(cred.password, "s3cret");

        // Passwords may contain colons; usernames may not be empty.
        let cred: UserCredential = "admin:a:b".parse().unwrap();
        assert_eq!(cred.password, "a:b");
        assert!(":nope".parse::<UserCredential>().is_err());
        assert!("nope".parse::<UserCredential>().is_err());
    }

    #[test]
    fn test_production_mode_requires_users() {
        assert!(Config::new(vec![], DEFAULT_PORT, false).is_err());
        assert!(Config::new(vec![], DEFAULT_PORT, true).is_ok());
    }
}
