//! Typed message bodies, one module per sub-protocol.
//!
//! These are plain data structs mirroring the Avro records of the ETP v1.2
//! schema set; serialization lives in [`crate::codec`].

pub mod core;
pub mod dataarray;
pub mod dataspace;
pub mod discovery;
pub mod store;
pub mod supported_types;
pub mod transaction;

use std::collections::BTreeMap;

/// A loosely-typed capability or custom-data value.
///
/// The handshake exchanges endpoint capabilities as a map of these; the
/// subset here covers every kind the v1.2 capability tables use.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    /// Used for ACL and legal-tag lists in dataspace custom data.
    StringArray(Vec<String>),
}

impl DataValue {
    /// Numeric view, used when reading size capabilities.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DataValue::Int(v) => Some(i64::from(*v)),
            DataValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// Capability maps appear on sessions, dataspaces, and supported types.
pub type DataValueMap = BTreeMap<String, DataValue>;

/// Scope selector used by discovery and supported-types queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextScopeKind {
    Self_,
    Sources,
    Targets,
    SourcesOrSelf,
    TargetsOrSelf,
    TargetsAndSelf,
}

impl ContextScopeKind {
    pub fn symbol(self) -> &'static str {
        match self {
            ContextScopeKind::Self_ => "self",
            ContextScopeKind::Sources => "sources",
            ContextScopeKind::Targets => "targets",
            ContextScopeKind::SourcesOrSelf => "sourcesOrSelf",
            ContextScopeKind::TargetsOrSelf => "targetsOrSelf",
            ContextScopeKind::TargetsAndSelf => "targetsAndSelf",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "self" => ContextScopeKind::Self_,
            "sources" => ContextScopeKind::Sources,
            "targets" => ContextScopeKind::Targets,
            "sourcesOrSelf" => ContextScopeKind::SourcesOrSelf,
            "targetsOrSelf" => ContextScopeKind::TargetsOrSelf,
            "targetsAndSelf" => ContextScopeKind::TargetsAndSelf,
            _ => return None,
        })
    }
}

/// Active-status filter of discovery results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveStatusKind {
    Inactive,
    Active,
}

impl ActiveStatusKind {
    pub fn symbol(self) -> &'static str {
        match self {
            ActiveStatusKind::Inactive => "Inactive",
            ActiveStatusKind::Active => "Active",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "Inactive" => ActiveStatusKind::Inactive,
            "Active" => ActiveStatusKind::Active,
            _ => return None,
        })
    }
}
