//! Newsletter recipients.
//!
//! The pipeline asks its [`UserDirectory`] for the recipient list on every
//! dispatch attempt, so edits to the underlying source take effect on the
//! next run without a restart.

use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use mailer::{Address, Mailbox};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DirectoryError;

/// Environment variable read by [`EnvUserDirectory`].
pub const RECIPIENTS_ENV_VAR: &str = "NEWSLETTER_RECIPIENTS";

/// A newsletter subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name used in the greeting.
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl From<Mailbox> for User {
    /// The display name, or the address's local part when there is none.
    fn from(mailbox: Mailbox) -> Self {
        let name = mailbox
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| mailbox.email.user().to_string());
        Self::new(name, mailbox.email.to_string())
    }
}

/// Source of newsletter recipients.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError>;
}

/// A fixed recipient list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<User>,
}

impl StaticDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.users.clone())
    }
}

/// Recipients from an environment variable.
///
/// Entries are separated by `;` and written as `Name <email>` or a bare
/// address, in which case the local part becomes the name. A `;` inside a
/// quoted display name does not separate entries.
#[derive(Debug, Clone)]
pub struct EnvUserDirectory {
    var: String,
}

impl Default for EnvUserDirectory {
    fn default() -> Self {
        Self::new(RECIPIENTS_ENV_VAR)
    }
}

impl EnvUserDirectory {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl UserDirectory for EnvUserDirectory {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let value = env::var(&self.var).map_err(|_| DirectoryError::MissingEnvVar(self.var.clone()))?;
        let users = parse_recipients(&value)?;
        debug!(var = %self.var, users = users.len(), "Loaded recipients from environment");
        Ok(users)
    }
}

/// Recipients from a JSON file holding an array of `{"name", "email"}` objects.
///
/// The file is read again on every call.
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    path: PathBuf,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UserDirectory for JsonFileDirectory {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let users: Vec<User> = serde_json::from_str(&contents)?;
        for user in &users {
            user.email
                .parse::<Address>()
                .map_err(|e| DirectoryError::Invalid(format!("{}: {}", user.email, e)))?;
        }
        debug!(path = %self.path.display(), users = users.len(), "Loaded recipients from file");
        Ok(users)
    }
}

/// Parse a `;`-separated recipient list.
pub fn parse_recipients(value: &str) -> Result<Vec<User>, DirectoryError> {
    split_entries(value)
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_recipient)
        .collect()
}

fn parse_recipient(entry: &str) -> Result<User, DirectoryError> {
    entry
        .parse::<Mailbox>()
        .map(User::from)
        .map_err(|e| DirectoryError::Invalid(format!("{}: {}", entry, e)))
}

/// Split on `;` outside double quotes.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}
