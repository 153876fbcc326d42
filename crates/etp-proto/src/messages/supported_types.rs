//! SupportedTypes protocol (25): which qualified types a store holds.

use super::ContextScopeKind;

/// Message type discriminants within protocol 25.
pub mod msg {
    pub const GET_SUPPORTED_TYPES: i32 = 1;
    pub const GET_SUPPORTED_TYPES_RESPONSE: i32 = 2;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetSupportedTypes {
    pub uri: String,
    pub scope: ContextScopeKind,
    /// Include types the store supports but currently has no objects of.
    pub return_empty_types: bool,
    pub count_objects: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedType {
    /// E.g. `resqml22.FaultInterpretation`.
    pub data_object_type: String,
    pub object_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetSupportedTypesResponse {
    pub supported_types: Vec<SupportedType>,
}
