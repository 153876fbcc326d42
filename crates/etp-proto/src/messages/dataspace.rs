//! Dataspace protocol (24): named namespaces holding data objects.

use std::collections::BTreeMap;

use super::DataValueMap;

/// Message type discriminants within protocol 24.
pub mod msg {
    pub const GET_DATASPACES: i32 = 1;
    pub const GET_DATASPACES_RESPONSE: i32 = 2;
    pub const PUT_DATASPACES: i32 = 3;
    pub const DELETE_DATASPACES: i32 = 4;
    pub const DELETE_DATASPACES_RESPONSE: i32 = 5;
    pub const PUT_DATASPACES_RESPONSE: i32 = 6;
}

/// A server-side namespace.
///
/// ACL and legal-tag metadata travels in `custom_data` (the convention the
/// OSDU deployments use); `path` is the store-relative display path.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataspace {
    pub uri: String,
    pub path: Option<String>,
    /// Epoch microseconds.
    pub store_last_write: i64,
    pub store_created: i64,
    pub custom_data: DataValueMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetDataspaces {
    pub store_last_write_filter: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDataspacesResponse {
    pub dataspaces: Vec<Dataspace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutDataspaces {
    pub dataspaces: BTreeMap<String, Dataspace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataspacesResponse {
    pub success: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataspaces {
    pub uris: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataspacesResponse {
    pub success: BTreeMap<String, bool>,
}
