//! Credential store

use std::collections::HashMap;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Result of checking a username/secret pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Username known and secret matches
    Granted,
    /// No such username
    UnknownUser,
    /// Username known, secret differs
    WrongSecret,
}

/// Username to secret table, immutable after construction
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Create a store from username/secret pairs
    pub fn new<I, K, V>(users: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            users: users
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build the store from the `[auth]` configuration section
    pub fn from_config(config: &AuthConfig) -> Self {
        let store = Self::new(config.users.iter().map(|(k, v)| (k.clone(), v.clone())));
        for username in config.users.keys() {
            tracing::info!("Registered User: '{}'", username);
        }
        store
    }

    /// Check a username/secret pair
    pub fn verify(&self, username: &str, secret: &str) -> AuthOutcome {
        match self.users.get(username) {
            None => AuthOutcome::UnknownUser,
            Some(stored) if stored == secret => AuthOutcome::Granted,
            Some(_) => AuthOutcome::WrongSecret,
        }
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Registered usernames, sorted
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Parse a comma-delimited `username=secret` list
///
/// Each pair is split at the first `=`, so secrets may contain `=`. Blank
/// items are skipped; an item with no `=` or an empty username is an error.
pub fn parse_user_list(list: &str) -> Result<Vec<(String, String)>> {
    let mut users = Vec::new();

    for entry in list.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (username, secret) = entry.split_once('=').ok_or_else(|| Error::InvalidUserEntry {
            entry: entry.to_string(),
            reason: "expected username=secret".to_string(),
        })?;

        if username.is_empty() {
            return Err(Error::InvalidUserEntry {
                entry: entry.to_string(),
                reason: "username cannot be empty".to_string(),
            });
        }

        users.push((username.to_string(), secret.to_string()));
    }

    Ok(users)
}
