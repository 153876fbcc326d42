//! Discovery protocol (3): graph traversal over the store's resources.

use super::{ActiveStatusKind, ContextScopeKind};

/// Message type discriminants within protocol 3.
pub mod msg {
    pub const GET_RESOURCES: i32 = 1;
    pub const GET_RESOURCES_RESPONSE: i32 = 4;
    pub const GET_RESOURCES_EDGES_RESPONSE: i32 = 7;
}

/// Resource query rooted at `uri`.
///
/// The server streams any number of [`GetResourcesResponse`] (and, when
/// `include_edges` is set, [`GetResourcesEdgesResponse`]) bodies sharing
/// the request's correlation id; the last body carries FINAL.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResources {
    pub uri: String,
    /// Traversal depth; 1 lists direct members only.
    pub depth: i32,
    pub scope: ContextScopeKind,
    pub count_objects: bool,
    /// Only resources written after this store time (epoch micros).
    pub store_last_write_filter: Option<i64>,
    pub active_status_filter: Option<ActiveStatusKind>,
    pub include_edges: bool,
}

/// One discovered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    /// Only populated when the query asked for object counts.
    pub source_count: Option<i32>,
    pub target_count: Option<i32>,
    /// Epoch microseconds.
    pub last_changed: i64,
    pub store_last_write: i64,
    pub active_status: ActiveStatusKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetResourcesResponse {
    pub resources: Vec<Resource>,
}

/// A relationship edge between two discovered resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source_uri: String,
    pub target_uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetResourcesEdgesResponse {
    pub edges: Vec<Edge>,
}
