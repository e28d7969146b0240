//! Session state threaded through the lifecycle steps.
//!
//! A run owns exactly one [`SessionState`]. Steps borrow it immutably to build
//! their request and mutably to record what the service handed back.

use rand::Rng;
use serde::Serialize;
use std::fmt;

/// A piece of session state a step can depend on or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Username,
    Token,
    UserId,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Token => "token",
            Field::UserId => "user_id",
        };
        f.write_str(name)
    }
}

/// Mutable identity and credential record for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Identity used for the next login attempt
    pub username: String,
    /// Bearer token from the most recent successful login
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Identifier issued at first login
    pub user_id: Option<String>,
}

/// Borrowed view of the credentials an authenticated call needs.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated<'a> {
    pub token: &'a str,
    pub user_id: &'a str,
}

impl SessionState {
    /// Start a session for a known username
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: None,
            user_id: None,
        }
    }

    /// Start a session with a collision-resistant username: `<prefix><1000..=9999>`
    pub fn with_random_username(prefix: &str) -> Self {
        let suffix: u16 = rand::rng().random_range(1000..=9999);
        Self::new(format!("{}{}", prefix, suffix))
    }

    /// Whether a field currently holds a usable value
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Username => !self.username.is_empty(),
            Field::Token => self.token.as_deref().is_some_and(|t| !t.is_empty()),
            Field::UserId => self.user_id.as_deref().is_some_and(|id| !id.is_empty()),
        }
    }

    /// Token and user id together, or `None` when either is missing
    pub fn authenticated(&self) -> Option<Authenticated<'_>> {
        match (self.token.as_deref(), self.user_id.as_deref()) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Some(Authenticated { token, user_id })
            }
            _ => None,
        }
    }

    /// First field in `fields` that is not populated
    pub fn first_missing(&self, fields: &[Field]) -> Option<Field> {
        fields.iter().copied().find(|f| !self.has(*f))
    }
}
