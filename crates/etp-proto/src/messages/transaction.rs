//! Transaction protocol (18): server-side transactions over dataspaces.
//!
//! The client enforces at most one active transaction per session; the
//! guard lives in the client crate and fails locally without a round trip.

use uuid::Uuid;

/// Message type discriminants within protocol 18.
pub mod msg {
    pub const START_TRANSACTION: i32 = 1;
    pub const START_TRANSACTION_RESPONSE: i32 = 2;
    pub const COMMIT_TRANSACTION: i32 = 3;
    pub const ROLLBACK_TRANSACTION: i32 = 4;
    pub const COMMIT_TRANSACTION_RESPONSE: i32 = 5;
    pub const ROLLBACK_TRANSACTION_RESPONSE: i32 = 6;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTransaction {
    pub dataspace_uris: Vec<String>,
    pub read_only: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTransactionResponse {
    pub transaction_uuid: Uuid,
    pub successful: bool,
    pub failure_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTransaction {
    pub transaction_uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTransactionResponse {
    pub transaction_uuid: Uuid,
    pub successful: bool,
    pub failure_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackTransaction {
    pub transaction_uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackTransactionResponse {
    pub transaction_uuid: Uuid,
    pub successful: bool,
    pub failure_reason: String,
}
