//! DataArray protocol (9): whole-array and subarray transfer.
//!
//! Arrays larger than the negotiated `MaxDataArraySize` never travel
//! whole: the sender tiles the shape into row-major windows and issues one
//! `PutDataSubarrays`/`GetDataSubarrays` per window.

use std::collections::BTreeMap;

use crate::arrays::{AnyArray, AnyArrayType};

/// Message type discriminants within protocol 9.
pub mod msg {
    pub const GET_DATA_ARRAYS_RESPONSE: i32 = 1;
    pub const GET_DATA_ARRAYS: i32 = 2;
    pub const GET_DATA_SUBARRAYS: i32 = 3;
    pub const PUT_DATA_ARRAYS: i32 = 4;
    pub const PUT_DATA_SUBARRAYS: i32 = 5;
    pub const GET_DATA_ARRAY_METADATA: i32 = 6;
    pub const GET_DATA_ARRAY_METADATA_RESPONSE: i32 = 7;
    pub const GET_DATA_SUBARRAYS_RESPONSE: i32 = 8;
    pub const PUT_DATA_ARRAYS_RESPONSE: i32 = 10;
    pub const PUT_DATA_SUBARRAYS_RESPONSE: i32 = 11;
}

/// Addresses one array: the owning object's URI plus the path of the
/// array inside that resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataArrayIdentifier {
    pub uri: String,
    pub path_in_resource: String,
}

/// A whole array: shape plus flattened row-major payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub dimensions: Vec<i64>,
    pub data: AnyArray,
}

/// Shape and transport type of a stored array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArrayMetadata {
    pub dimensions: Vec<i64>,
    pub transport_array_type: AnyArrayType,
    pub store_last_write: i64,
    pub store_created: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataArrays {
    pub data_arrays: BTreeMap<String, DataArrayIdentifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDataArraysResponse {
    pub data_arrays: BTreeMap<String, DataArray>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutDataArraysType {
    pub uid: DataArrayIdentifier,
    pub array: DataArray,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutDataArrays {
    pub data_arrays: BTreeMap<String, PutDataArraysType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataArraysResponse {
    pub success: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataArrayMetadata {
    pub data_arrays: BTreeMap<String, DataArrayIdentifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataArrayMetadataResponse {
    pub array_metadata: BTreeMap<String, DataArrayMetadata>,
}

/// One requested window: per-dimension start and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataSubarraysType {
    pub uid: DataArrayIdentifier,
    pub starts: Vec<i64>,
    pub counts: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataSubarrays {
    pub data_subarrays: BTreeMap<String, GetDataSubarraysType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDataSubarraysResponse {
    pub data_subarrays: BTreeMap<String, DataArray>,
}

/// One written window: the window coordinates plus its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PutDataSubarraysType {
    pub uid: DataArrayIdentifier,
    pub data: AnyArray,
    pub starts: Vec<i64>,
    pub counts: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutDataSubarrays {
    pub data_subarrays: BTreeMap<String, PutDataSubarraysType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataSubarraysResponse {
    pub success: BTreeMap<String, bool>,
}
