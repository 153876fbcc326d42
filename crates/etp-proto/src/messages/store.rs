//! Store protocol (4): data object CRUD plus chunked transfer of large
//! object bodies.
//!
//! An object whose body exceeds the negotiated `MaxDataObjectSize` travels
//! as a `PutDataObjects` (or `GetDataObjectsResponse`) carrying the object
//! metadata with a `blob_id` and an empty body, followed by `Chunk`
//! messages that share the parent's message id via MULTIPART.  The
//! receiver stitches chunk payloads back onto the object by `blob_id`.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::discovery::Resource;

/// Message type discriminants within protocol 4.
pub mod msg {
    pub const GET_DATA_OBJECTS: i32 = 1;
    pub const PUT_DATA_OBJECTS: i32 = 2;
    pub const DELETE_DATA_OBJECTS: i32 = 3;
    pub const GET_DATA_OBJECTS_RESPONSE: i32 = 4;
    pub const CHUNK: i32 = 8;
    pub const PUT_DATA_OBJECTS_RESPONSE: i32 = 9;
    pub const DELETE_DATA_OBJECTS_RESPONSE: i32 = 10;
}

/// A typed energy-domain object: resource metadata plus an XML or JSON
/// body keyed by URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    pub resource: Resource,
    /// `"xml"` or `"json"`.
    pub format: String,
    /// Present when the body travels separately as chunks.
    pub blob_id: Option<Uuid>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataObjects {
    pub uris: BTreeMap<String, String>,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDataObjectsResponse {
    pub data_objects: BTreeMap<String, DataObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutDataObjects {
    pub data_objects: BTreeMap<String, DataObject>,
    pub prune_contained_objects: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataObjectsResponse {
    pub success: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataObjects {
    pub uris: BTreeMap<String, String>,
    pub prune_contained_objects: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataObjectsResponse {
    pub success: BTreeMap<String, bool>,
}

/// One slice of a large object body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub blob_id: Uuid,
    pub data: Vec<u8>,
    /// True on the last chunk of a blob.
    pub final_chunk: bool,
}
