//! Client error taxonomy and the server-reply sum type.

use etp_proto::CodecError;
use etp_proto::arrays::UnsupportedElementKind;
use etp_proto::messages::core::ProtocolException;
use etp_proto::uri::UriError;
use thiserror::Error;

use crate::auth::TokenError;
use crate::config::ConfigError;

/// Errors surfaced by client operations.
///
/// A server-reported [`ProtocolException`] is NOT an error: it is returned
/// as [`Outcome::Rejected`] so callers branch on the reply variant.
/// `Timeout` is the one failure with its own channel, per contract.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("session handshake timed out")]
    HandshakeTimeout,
    #[error("request timed out")]
    Timeout,
    #[error("request cancelled")]
    Cancelled,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("reassembled message {message_id} exceeds the negotiated payload limit")]
    MessageTooLarge { message_id: i64 },
    #[error("duplicate message id {0}")]
    DuplicateMessageId(i64),
    #[error("transport: {0}")]
    Transport(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    InvalidUri(#[from] UriError),
    #[error(transparent)]
    UnsupportedElementKind(#[from] UnsupportedElementKind),
    #[error("no active transaction")]
    NoActiveTransaction,
    #[error("a transaction is already active on this session")]
    TransactionAlreadyActive,
    #[error(transparent)]
    Auth(#[from] TokenError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A server reply: the requested value, or the server's exception for the
/// request as a first-class value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Value(T),
    Rejected(ProtocolException),
}

impl<T> Outcome<T> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Rejected(_) => None,
        }
    }

    /// Convert into a `Result` for callers that treat rejection as an error.
    pub fn into_result(self) -> Result<T, ProtocolException> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Rejected(e) => Err(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::Rejected(e) => Outcome::Rejected(e),
        }
    }
}
