use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// The authenticated subject carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique, email-like identifier
    pub identifier: String,
    /// Display name
    pub name: String,
}

impl Identity {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

/// Intended use of a token. Both kinds share the same claim layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims issued by this service.
///
/// Every field is required: decoding a token whose payload lacks one of them,
/// or carries it with the wrong JSON type, fails outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (the identity's unique identifier)
    pub sub: String,

    /// Display name of the subject
    pub name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Access or refresh
    pub token_type: TokenKind,
}

impl Claims {
    /// Build claims for `identity` valid from `issued_at` for `ttl`.
    pub fn new(
        identity: &Identity,
        token_type: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expiration = issued_at + ttl;

        Self {
            sub: identity.identifier.clone(),
            name: identity.name.clone(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            token_type,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.name.clone())
    }

    /// Check if token is expired. A token is no longer valid at the exact
    /// second of its expiration.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
