//! Authentication material for the WebSocket upgrade request.
//!
//! The client never refreshes tokens itself: a [`TokenSource`] is invoked
//! once per connection attempt, and whatever it returns is applied to that
//! upgrade request only.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("token source: {0}")]
pub struct TokenError(pub String);

/// External provider of bearer tokens, called once per connection attempt.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Result<String, TokenError>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Result<String, TokenError> + Send + Sync,
{
    fn token(&self) -> Result<String, TokenError> {
        self()
    }
}

/// Credentials applied to the upgrade request.
#[derive(Clone, Default)]
pub enum Credentials {
    #[default]
    None,
    /// Full `Authorization` header value (`Bearer …`).
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
    /// Token fetched from an external provider on every connect.
    Provider(Arc<dyn TokenSource>),
}

impl Credentials {
    /// Bearer credentials from a raw token; a missing `Bearer` prefix is
    /// added, a token already carrying one is kept as-is.
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer(with_bearer_prefix(token.into()))
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic { username: username.into(), password: password.into() }
    }

    /// Resolve the `Authorization` header value for one connection attempt.
    pub(crate) fn authorization_header(&self) -> Result<Option<String>, TokenError> {
        Ok(match self {
            Credentials::None => None,
            Credentials::Bearer(value) => Some(value.clone()),
            Credentials::Basic { username, password } => {
                Some(format!("Basic {}", BASE64.encode(format!("{username}:{password}"))))
            }
            Credentials::Provider(source) => Some(with_bearer_prefix(source.token()?)),
        })
    }
}

fn with_bearer_prefix(token: String) -> String {
    if token.to_lowercase().contains("bearer") {
        token
    } else {
        format!("Bearer {token}")
    }
}

// Never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::Bearer(_) => write!(f, "Bearer(***)"),
            Credentials::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Credentials::Provider(_) => write!(f, "Provider(..)"),
        }
    }
}
