//! Core protocol (0): session handshake, keep-alive, authorization, and
//! the `ProtocolException` error channel.

use uuid::Uuid;

use super::DataValueMap;

/// Message type discriminants within protocol 0.
pub mod msg {
    pub const REQUEST_SESSION: i32 = 1;
    pub const OPEN_SESSION: i32 = 2;
    pub const CLOSE_SESSION: i32 = 5;
    pub const AUTHORIZE: i32 = 6;
    pub const AUTHORIZE_RESPONSE: i32 = 7;
    pub const PING: i32 = 8;
    pub const PONG: i32 = 9;
    pub const PROTOCOL_EXCEPTION: i32 = 1000;
    pub const ACKNOWLEDGE: i32 = 1001;
}

/// One protocol the client offers (or the server accepts) for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedProtocol {
    pub protocol: i32,
    /// Protocol version, `major.minor.revision.patch`.
    pub protocol_version: ProtocolVersion,
    /// `"store"` when asking the peer to act as a store, `"customer"`
    /// for the consuming side.
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: i32,
    pub minor: i32,
    pub revision: i32,
    pub patch: i32,
}

impl ProtocolVersion {
    /// The protocol version this client implements.
    pub const V1_2: Self = Self {
        major: 1,
        minor: 2,
        revision: 0,
        patch: 0,
    };
}

/// First message of the handshake, sent by the client on socket open.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSession {
    pub application_name: String,
    pub application_version: String,
    pub client_instance_id: Uuid,
    pub requested_protocols: Vec<SupportedProtocol>,
    pub supported_formats: Vec<String>,
    /// Microseconds since the Unix epoch.
    pub current_date_time: i64,
    pub endpoint_capabilities: DataValueMap,
}

/// Server acceptance of a session; carries the intersected protocol set
/// and the (possibly reduced) capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSession {
    pub application_name: String,
    pub application_version: String,
    pub server_instance_id: Uuid,
    pub supported_protocols: Vec<SupportedProtocol>,
    pub supported_formats: Vec<String>,
    pub session_id: Uuid,
    pub current_date_time: i64,
    pub endpoint_capabilities: DataValueMap,
}

/// Graceful session termination, either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSession {
    pub reason: String,
}

/// Keep-alive probe; the reply correlates to the probe's message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub current_date_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong {
    pub current_date_time: i64,
}

/// Mid-session (re-)authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorize {
    /// Full header value, e.g. `Bearer <token>`.
    pub authorization: String,
    pub supplemental_authorization: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeResponse {
    pub success: bool,
    pub challenges: Vec<String>,
}

/// Server-reported error.
///
/// Correlated exceptions resolve the waiting request and are returned as
/// values; an uncorrelated exception is session-fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolException {
    pub code: i32,
    pub message: String,
}

/// Explicit acknowledgement, sent when a request sets the ACK flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acknowledge;
