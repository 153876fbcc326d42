//! Conversions between typed bodies and `apache_avro::types::Value`.
//!
//! Values are constructed and taken apart explicitly so that union branch
//! selection is deterministic; the adapter never interprets fields beyond
//! matching them to their schema position.

use std::collections::{BTreeMap, HashMap};

use apache_avro::types::Value;
use uuid::Uuid;

use crate::arrays::{AnyArray, AnyArrayType};
use crate::body::EtpBody;
use crate::error::CodecError;
use crate::messages::core::*;
use crate::messages::dataarray::*;
use crate::messages::dataspace::*;
use crate::messages::discovery::*;
use crate::messages::store::*;
use crate::messages::supported_types::*;
use crate::messages::transaction::*;
use crate::messages::{ActiveStatusKind, ContextScopeKind, DataValue, DataValueMap};
use crate::protocols;

// ---------------------------------------------------------------------------
// Value construction helpers
// ---------------------------------------------------------------------------

fn record(fields: Vec<(&str, Value)>) -> Value {
    Value::Record(fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
}

fn nullable(inner: Option<Value>) -> Value {
    match inner {
        None => Value::Union(0, Box::new(Value::Null)),
        Some(v) => Value::Union(1, Box::new(v)),
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
}

fn long_array(items: &[i64]) -> Value {
    Value::Array(items.iter().map(|v| Value::Long(*v)).collect())
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn bool_map(map: &BTreeMap<String, bool>) -> Value {
    Value::Map(map.iter().map(|(k, v)| (k.clone(), Value::Boolean(*v))).collect())
}

fn value_map<T>(map: &BTreeMap<String, T>, f: impl Fn(&T) -> Value) -> Value {
    Value::Map(map.iter().map(|(k, v)| (k.clone(), f(v))).collect())
}

fn uuid_value(uuid: &Uuid) -> Value {
    Value::Fixed(16, uuid.as_bytes().to_vec())
}

// ---------------------------------------------------------------------------
// Value extraction helpers
// ---------------------------------------------------------------------------

/// Field access over a decoded record, consuming fields by wire name.
struct Fields(HashMap<String, Value>);

impl Fields {
    fn from(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Record(fields) => Ok(Self(fields.into_iter().collect())),
            other => Err(CodecError::format(format!("expected record, got {other:?}"))),
        }
    }

    fn take(&mut self, name: &str) -> Result<Value, CodecError> {
        self.0
            .remove(name)
            .ok_or_else(|| CodecError::format(format!("missing field `{name}`")))
    }
}

/// Strip one union wrapper, if present.
fn unwrap_union(value: Value) -> Value {
    match value {
        Value::Union(_, inner) => *inner,
        other => other,
    }
}

/// Nullable field: `None` for the null branch, the inner value otherwise.
fn optional(value: Value) -> Option<Value> {
    match unwrap_union(value) {
        Value::Null => None,
        inner => Some(inner),
    }
}

fn as_string(value: Value) -> Result<String, CodecError> {
    match unwrap_union(value) {
        Value::String(s) => Ok(s),
        other => Err(CodecError::format(format!("expected string, got {other:?}"))),
    }
}

fn as_i32(value: Value) -> Result<i32, CodecError> {
    match unwrap_union(value) {
        Value::Int(v) => Ok(v),
        other => Err(CodecError::format(format!("expected int, got {other:?}"))),
    }
}

fn as_i64(value: Value) -> Result<i64, CodecError> {
    match unwrap_union(value) {
        Value::Long(v) => Ok(v),
        Value::Int(v) => Ok(i64::from(v)),
        other => Err(CodecError::format(format!("expected long, got {other:?}"))),
    }
}

fn as_bool(value: Value) -> Result<bool, CodecError> {
    match unwrap_union(value) {
        Value::Boolean(v) => Ok(v),
        other => Err(CodecError::format(format!("expected boolean, got {other:?}"))),
    }
}

fn as_f32(value: Value) -> Result<f32, CodecError> {
    match unwrap_union(value) {
        Value::Float(v) => Ok(v),
        other => Err(CodecError::format(format!("expected float, got {other:?}"))),
    }
}

fn as_f64(value: Value) -> Result<f64, CodecError> {
    match unwrap_union(value) {
        Value::Double(v) => Ok(v),
        Value::Float(v) => Ok(f64::from(v)),
        other => Err(CodecError::format(format!("expected double, got {other:?}"))),
    }
}

fn as_bytes(value: Value) -> Result<Vec<u8>, CodecError> {
    match unwrap_union(value) {
        Value::Bytes(v) | Value::Fixed(_, v) => Ok(v),
        other => Err(CodecError::format(format!("expected bytes, got {other:?}"))),
    }
}

fn as_array(value: Value) -> Result<Vec<Value>, CodecError> {
    match unwrap_union(value) {
        Value::Array(items) => Ok(items),
        other => Err(CodecError::format(format!("expected array, got {other:?}"))),
    }
}

fn as_map(value: Value) -> Result<HashMap<String, Value>, CodecError> {
    match unwrap_union(value) {
        Value::Map(entries) => Ok(entries),
        other => Err(CodecError::format(format!("expected map, got {other:?}"))),
    }
}

fn as_enum_symbol(value: Value) -> Result<String, CodecError> {
    match unwrap_union(value) {
        Value::Enum(_, symbol) => Ok(symbol),
        Value::String(symbol) => Ok(symbol),
        other => Err(CodecError::format(format!("expected enum, got {other:?}"))),
    }
}

fn as_uuid(value: Value) -> Result<Uuid, CodecError> {
    let bytes = as_bytes(value)?;
    Uuid::from_slice(&bytes).map_err(|e| CodecError::format(format!("bad uuid: {e}")))
}

fn string_vec(value: Value) -> Result<Vec<String>, CodecError> {
    as_array(value)?.into_iter().map(as_string).collect()
}

fn long_vec(value: Value) -> Result<Vec<i64>, CodecError> {
    as_array(value)?.into_iter().map(as_i64).collect()
}

fn string_btree(value: Value) -> Result<BTreeMap<String, String>, CodecError> {
    as_map(value)?
        .into_iter()
        .map(|(k, v)| Ok((k, as_string(v)?)))
        .collect()
}

fn bool_btree(value: Value) -> Result<BTreeMap<String, bool>, CodecError> {
    as_map(value)?
        .into_iter()
        .map(|(k, v)| Ok((k, as_bool(v)?)))
        .collect()
}

fn btree_of<T>(
    value: Value,
    f: impl Fn(Value) -> Result<T, CodecError>,
) -> Result<BTreeMap<String, T>, CodecError> {
    as_map(value)?.into_iter().map(|(k, v)| Ok((k, f(v)?))).collect()
}

// ---------------------------------------------------------------------------
// Datatype conversions
// ---------------------------------------------------------------------------

// DataValue travels as a record holding a single union field, so maps of
// capabilities stay schema-resolvable.  Union branch order is fixed by the
// schema: null, boolean, int, long, double, string, ArrayOfString.
fn data_value_value(value: &DataValue) -> Value {
    let item = match value {
        DataValue::Null => Value::Union(0, Box::new(Value::Null)),
        DataValue::Boolean(v) => Value::Union(1, Box::new(Value::Boolean(*v))),
        DataValue::Int(v) => Value::Union(2, Box::new(Value::Int(*v))),
        DataValue::Long(v) => Value::Union(3, Box::new(Value::Long(*v))),
        DataValue::Double(v) => Value::Union(4, Box::new(Value::Double(*v))),
        DataValue::String(v) => Value::Union(5, Box::new(Value::String(v.clone()))),
        DataValue::StringArray(v) => {
            Value::Union(6, Box::new(record(vec![("values", string_array(v))])))
        }
    };
    record(vec![("item", item)])
}

fn data_value_from(value: Value) -> Result<DataValue, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(match unwrap_union(fields.take("item")?) {
        Value::Null => DataValue::Null,
        Value::Boolean(v) => DataValue::Boolean(v),
        Value::Int(v) => DataValue::Int(v),
        Value::Long(v) => DataValue::Long(v),
        Value::Double(v) => DataValue::Double(v),
        Value::String(v) => DataValue::String(v),
        Value::Record(fields) => {
            let mut inner = Fields(fields.into_iter().collect());
            DataValue::StringArray(string_vec(inner.take("values")?)?)
        }
        other => return Err(CodecError::format(format!("bad DataValue item: {other:?}"))),
    })
}

fn data_value_map_value(map: &DataValueMap) -> Value {
    value_map(map, data_value_value)
}

fn data_value_map_from(value: Value) -> Result<DataValueMap, CodecError> {
    btree_of(value, data_value_from)
}

fn scope_value(scope: ContextScopeKind) -> Value {
    let index = match scope {
        ContextScopeKind::Self_ => 0,
        ContextScopeKind::Sources => 1,
        ContextScopeKind::Targets => 2,
        ContextScopeKind::SourcesOrSelf => 3,
        ContextScopeKind::TargetsOrSelf => 4,
        ContextScopeKind::TargetsAndSelf => 5,
    };
    Value::Enum(index, scope.symbol().to_owned())
}

fn scope_from(value: Value) -> Result<ContextScopeKind, CodecError> {
    let symbol = as_enum_symbol(value)?;
    ContextScopeKind::from_symbol(&symbol)
        .ok_or_else(|| CodecError::format(format!("bad ContextScopeKind `{symbol}`")))
}

fn active_status_value(status: ActiveStatusKind) -> Value {
    let index = match status {
        ActiveStatusKind::Inactive => 0,
        ActiveStatusKind::Active => 1,
    };
    Value::Enum(index, status.symbol().to_owned())
}

fn active_status_from(value: Value) -> Result<ActiveStatusKind, CodecError> {
    let symbol = as_enum_symbol(value)?;
    ActiveStatusKind::from_symbol(&symbol)
        .ok_or_else(|| CodecError::format(format!("bad ActiveStatusKind `{symbol}`")))
}

fn any_array_type_value(transport: AnyArrayType) -> Value {
    let index = match transport {
        AnyArrayType::ArrayOfBoolean => 0,
        AnyArrayType::ArrayOfInt => 1,
        AnyArrayType::ArrayOfLong => 2,
        AnyArrayType::ArrayOfFloat => 3,
        AnyArrayType::ArrayOfDouble => 4,
        AnyArrayType::ArrayOfString => 5,
        AnyArrayType::Bytes => 6,
    };
    Value::Enum(index, transport.symbol().to_owned())
}

fn any_array_type_from(value: Value) -> Result<AnyArrayType, CodecError> {
    let symbol = as_enum_symbol(value)?;
    AnyArrayType::from_symbol(&symbol)
        .ok_or_else(|| CodecError::format(format!("bad AnyArrayType `{symbol}`")))
}

fn version_value(version: &ProtocolVersion) -> Value {
    record(vec![
        ("major", Value::Int(version.major)),
        ("minor", Value::Int(version.minor)),
        ("revision", Value::Int(version.revision)),
        ("patch", Value::Int(version.patch)),
    ])
}

fn version_from(value: Value) -> Result<ProtocolVersion, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(ProtocolVersion {
        major: as_i32(fields.take("major")?)?,
        minor: as_i32(fields.take("minor")?)?,
        revision: as_i32(fields.take("revision")?)?,
        patch: as_i32(fields.take("patch")?)?,
    })
}

fn supported_protocol_value(sp: &SupportedProtocol) -> Value {
    record(vec![
        ("protocol", Value::Int(sp.protocol)),
        ("protocolVersion", version_value(&sp.protocol_version)),
        ("role", Value::String(sp.role.clone())),
    ])
}

fn supported_protocol_from(value: Value) -> Result<SupportedProtocol, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(SupportedProtocol {
        protocol: as_i32(fields.take("protocol")?)?,
        protocol_version: version_from(fields.take("protocolVersion")?)?,
        role: as_string(fields.take("role")?)?,
    })
}

fn resource_value(resource: &Resource) -> Value {
    record(vec![
        ("uri", Value::String(resource.uri.clone())),
        ("name", Value::String(resource.name.clone())),
        ("sourceCount", nullable(resource.source_count.map(Value::Int))),
        ("targetCount", nullable(resource.target_count.map(Value::Int))),
        ("lastChanged", Value::Long(resource.last_changed)),
        ("storeLastWrite", Value::Long(resource.store_last_write)),
        ("activeStatus", active_status_value(resource.active_status)),
    ])
}

fn resource_from(value: Value) -> Result<Resource, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(Resource {
        uri: as_string(fields.take("uri")?)?,
        name: as_string(fields.take("name")?)?,
        source_count: optional(fields.take("sourceCount")?).map(as_i32).transpose()?,
        target_count: optional(fields.take("targetCount")?).map(as_i32).transpose()?,
        last_changed: as_i64(fields.take("lastChanged")?)?,
        store_last_write: as_i64(fields.take("storeLastWrite")?)?,
        active_status: active_status_from(fields.take("activeStatus")?)?,
    })
}

fn dataspace_value(dataspace: &Dataspace) -> Value {
    record(vec![
        ("uri", Value::String(dataspace.uri.clone())),
        ("path", nullable(dataspace.path.clone().map(Value::String))),
        ("storeLastWrite", Value::Long(dataspace.store_last_write)),
        ("storeCreated", Value::Long(dataspace.store_created)),
        ("customData", data_value_map_value(&dataspace.custom_data)),
    ])
}

fn dataspace_from(value: Value) -> Result<Dataspace, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(Dataspace {
        uri: as_string(fields.take("uri")?)?,
        path: optional(fields.take("path")?).map(as_string).transpose()?,
        store_last_write: as_i64(fields.take("storeLastWrite")?)?,
        store_created: as_i64(fields.take("storeCreated")?)?,
        custom_data: data_value_map_from(fields.take("customData")?)?,
    })
}

fn data_object_value(object: &DataObject) -> Value {
    record(vec![
        ("resource", resource_value(&object.resource)),
        ("format", Value::String(object.format.clone())),
        ("blobId", nullable(object.blob_id.as_ref().map(uuid_value))),
        ("data", Value::Bytes(object.data.clone())),
    ])
}

fn data_object_from(value: Value) -> Result<DataObject, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(DataObject {
        resource: resource_from(fields.take("resource")?)?,
        format: as_string(fields.take("format")?)?,
        blob_id: optional(fields.take("blobId")?).map(as_uuid).transpose()?,
        data: as_bytes(fields.take("data")?)?,
    })
}

// AnyArray union branch order is fixed by the schema: ArrayOfBoolean,
// ArrayOfInt, ArrayOfLong, ArrayOfFloat, ArrayOfDouble, ArrayOfString,
// bytes.
fn any_array_value(array: &AnyArray) -> Value {
    fn values_record(values: Value) -> Value {
        record(vec![("values", values)])
    }
    let item = match array {
        AnyArray::Boolean(v) => Value::Union(
            0,
            Box::new(values_record(Value::Array(v.iter().map(|b| Value::Boolean(*b)).collect()))),
        ),
        AnyArray::Int(v) => Value::Union(
            1,
            Box::new(values_record(Value::Array(v.iter().map(|i| Value::Int(*i)).collect()))),
        ),
        AnyArray::Long(v) => Value::Union(
            2,
            Box::new(values_record(Value::Array(v.iter().map(|i| Value::Long(*i)).collect()))),
        ),
        AnyArray::Float(v) => Value::Union(
            3,
            Box::new(values_record(Value::Array(v.iter().map(|f| Value::Float(*f)).collect()))),
        ),
        AnyArray::Double(v) => Value::Union(
            4,
            Box::new(values_record(Value::Array(v.iter().map(|f| Value::Double(*f)).collect()))),
        ),
        AnyArray::String(v) => Value::Union(5, Box::new(values_record(string_array(v)))),
        AnyArray::Bytes(v) => Value::Union(6, Box::new(Value::Bytes(v.clone()))),
    };
    record(vec![("item", item)])
}

fn any_array_from(value: Value) -> Result<AnyArray, CodecError> {
    let mut fields = Fields::from(value)?;
    let item = fields.take("item")?;
    let (branch, inner) = match item {
        Value::Union(branch, inner) => (branch, *inner),
        other => return Err(CodecError::format(format!("expected AnyArray union, got {other:?}"))),
    };
    if branch == 6 {
        return Ok(AnyArray::Bytes(as_bytes(inner)?));
    }
    let mut inner_fields = Fields::from(inner)?;
    let values = as_array(inner_fields.take("values")?)?;
    Ok(match branch {
        0 => AnyArray::Boolean(values.into_iter().map(as_bool).collect::<Result<_, _>>()?),
        1 => AnyArray::Int(values.into_iter().map(as_i32).collect::<Result<_, _>>()?),
        2 => AnyArray::Long(values.into_iter().map(as_i64).collect::<Result<_, _>>()?),
        3 => AnyArray::Float(values.into_iter().map(as_f32).collect::<Result<_, _>>()?),
        4 => AnyArray::Double(values.into_iter().map(as_f64).collect::<Result<_, _>>()?),
        5 => AnyArray::String(values.into_iter().map(as_string).collect::<Result<_, _>>()?),
        other => return Err(CodecError::format(format!("bad AnyArray branch {other}"))),
    })
}

fn identifier_value(uid: &DataArrayIdentifier) -> Value {
    record(vec![
        ("uri", Value::String(uid.uri.clone())),
        ("pathInResource", Value::String(uid.path_in_resource.clone())),
    ])
}

fn identifier_from(value: Value) -> Result<DataArrayIdentifier, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(DataArrayIdentifier {
        uri: as_string(fields.take("uri")?)?,
        path_in_resource: as_string(fields.take("pathInResource")?)?,
    })
}

fn data_array_value(array: &DataArray) -> Value {
    record(vec![
        ("dimensions", long_array(&array.dimensions)),
        ("data", any_array_value(&array.data)),
    ])
}

fn data_array_from(value: Value) -> Result<DataArray, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(DataArray {
        dimensions: long_vec(fields.take("dimensions")?)?,
        data: any_array_from(fields.take("data")?)?,
    })
}

fn metadata_value(metadata: &DataArrayMetadata) -> Value {
    record(vec![
        ("dimensions", long_array(&metadata.dimensions)),
        ("transportArrayType", any_array_type_value(metadata.transport_array_type)),
        ("storeLastWrite", Value::Long(metadata.store_last_write)),
        ("storeCreated", Value::Long(metadata.store_created)),
    ])
}

fn metadata_from(value: Value) -> Result<DataArrayMetadata, CodecError> {
    let mut fields = Fields::from(value)?;
    Ok(DataArrayMetadata {
        dimensions: long_vec(fields.take("dimensions")?)?,
        transport_array_type: any_array_type_from(fields.take("transportArrayType")?)?,
        store_last_write: as_i64(fields.take("storeLastWrite")?)?,
        store_created: as_i64(fields.take("storeCreated")?)?,
    })
}

// ---------------------------------------------------------------------------
// Message bodies → Value
// ---------------------------------------------------------------------------

pub(crate) fn body_to_value(body: &EtpBody) -> Value {
    match body {
        EtpBody::RequestSession(m) => record(vec![
            ("applicationName", Value::String(m.application_name.clone())),
            ("applicationVersion", Value::String(m.application_version.clone())),
            ("clientInstanceId", uuid_value(&m.client_instance_id)),
            (
                "requestedProtocols",
                Value::Array(m.requested_protocols.iter().map(supported_protocol_value).collect()),
            ),
            ("supportedFormats", string_array(&m.supported_formats)),
            ("currentDateTime", Value::Long(m.current_date_time)),
            ("endpointCapabilities", data_value_map_value(&m.endpoint_capabilities)),
        ]),
        EtpBody::OpenSession(m) => record(vec![
            ("applicationName", Value::String(m.application_name.clone())),
            ("applicationVersion", Value::String(m.application_version.clone())),
            ("serverInstanceId", uuid_value(&m.server_instance_id)),
            (
                "supportedProtocols",
                Value::Array(m.supported_protocols.iter().map(supported_protocol_value).collect()),
            ),
            ("supportedFormats", string_array(&m.supported_formats)),
            ("sessionId", uuid_value(&m.session_id)),
            ("currentDateTime", Value::Long(m.current_date_time)),
            ("endpointCapabilities", data_value_map_value(&m.endpoint_capabilities)),
        ]),
        EtpBody::CloseSession(m) => record(vec![("reason", Value::String(m.reason.clone()))]),
        EtpBody::Authorize(m) => record(vec![
            ("authorization", Value::String(m.authorization.clone())),
            ("supplementalAuthorization", string_map(&m.supplemental_authorization)),
        ]),
        EtpBody::AuthorizeResponse(m) => record(vec![
            ("success", Value::Boolean(m.success)),
            ("challenges", string_array(&m.challenges)),
        ]),
        EtpBody::Ping(m) => record(vec![("currentDateTime", Value::Long(m.current_date_time))]),
        EtpBody::Pong(m) => record(vec![("currentDateTime", Value::Long(m.current_date_time))]),
        EtpBody::ProtocolException(m) => record(vec![
            ("code", Value::Int(m.code)),
            ("message", Value::String(m.message.clone())),
        ]),
        EtpBody::Acknowledge(_) => Value::Record(Vec::new()),
        EtpBody::GetResources(m) => record(vec![
            ("uri", Value::String(m.uri.clone())),
            ("depth", Value::Int(m.depth)),
            ("scope", scope_value(m.scope)),
            ("countObjects", Value::Boolean(m.count_objects)),
            ("storeLastWriteFilter", nullable(m.store_last_write_filter.map(Value::Long))),
            ("activeStatusFilter", nullable(m.active_status_filter.map(active_status_value))),
            ("includeEdges", Value::Boolean(m.include_edges)),
        ]),
        EtpBody::GetResourcesResponse(m) => record(vec![(
            "resources",
            Value::Array(m.resources.iter().map(resource_value).collect()),
        )]),
        EtpBody::GetResourcesEdgesResponse(m) => record(vec![(
            "edges",
            Value::Array(
                m.edges
                    .iter()
                    .map(|e| {
                        record(vec![
                            ("sourceUri", Value::String(e.source_uri.clone())),
                            ("targetUri", Value::String(e.target_uri.clone())),
                        ])
                    })
                    .collect(),
            ),
        )]),
        EtpBody::GetDataObjects(m) => record(vec![
            ("uris", string_map(&m.uris)),
            ("format", Value::String(m.format.clone())),
        ]),
        EtpBody::GetDataObjectsResponse(m) => {
            record(vec![("dataObjects", value_map(&m.data_objects, data_object_value))])
        }
        EtpBody::PutDataObjects(m) => record(vec![
            ("dataObjects", value_map(&m.data_objects, data_object_value)),
            ("pruneContainedObjects", Value::Boolean(m.prune_contained_objects)),
        ]),
        EtpBody::PutDataObjectsResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::DeleteDataObjects(m) => record(vec![
            ("uris", string_map(&m.uris)),
            ("pruneContainedObjects", Value::Boolean(m.prune_contained_objects)),
        ]),
        EtpBody::DeleteDataObjectsResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::Chunk(m) => record(vec![
            ("blobId", uuid_value(&m.blob_id)),
            ("data", Value::Bytes(m.data.clone())),
            ("final", Value::Boolean(m.final_chunk)),
        ]),
        EtpBody::GetDataArrays(m) => {
            record(vec![("dataArrays", value_map(&m.data_arrays, identifier_value))])
        }
        EtpBody::GetDataArraysResponse(m) => {
            record(vec![("dataArrays", value_map(&m.data_arrays, data_array_value))])
        }
        EtpBody::PutDataArrays(m) => record(vec![(
            "dataArrays",
            value_map(&m.data_arrays, |t| {
                record(vec![("uid", identifier_value(&t.uid)), ("array", data_array_value(&t.array))])
            }),
        )]),
        EtpBody::PutDataArraysResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::GetDataArrayMetadata(m) => {
            record(vec![("dataArrays", value_map(&m.data_arrays, identifier_value))])
        }
        EtpBody::GetDataArrayMetadataResponse(m) => {
            record(vec![("arrayMetadata", value_map(&m.array_metadata, metadata_value))])
        }
        EtpBody::GetDataSubarrays(m) => record(vec![(
            "dataSubarrays",
            value_map(&m.data_subarrays, |t| {
                record(vec![
                    ("uid", identifier_value(&t.uid)),
                    ("starts", long_array(&t.starts)),
                    ("counts", long_array(&t.counts)),
                ])
            }),
        )]),
        EtpBody::GetDataSubarraysResponse(m) => {
            record(vec![("dataSubarrays", value_map(&m.data_subarrays, data_array_value))])
        }
        EtpBody::PutDataSubarrays(m) => record(vec![(
            "dataSubarrays",
            value_map(&m.data_subarrays, |t| {
                record(vec![
                    ("uid", identifier_value(&t.uid)),
                    ("data", any_array_value(&t.data)),
                    ("starts", long_array(&t.starts)),
                    ("counts", long_array(&t.counts)),
                ])
            }),
        )]),
        EtpBody::PutDataSubarraysResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::StartTransaction(m) => record(vec![
            ("dataspaceUris", string_array(&m.dataspace_uris)),
            ("readOnly", Value::Boolean(m.read_only)),
            ("message", Value::String(m.message.clone())),
        ]),
        EtpBody::StartTransactionResponse(m) => record(vec![
            ("transactionUuid", uuid_value(&m.transaction_uuid)),
            ("successful", Value::Boolean(m.successful)),
            ("failureReason", Value::String(m.failure_reason.clone())),
        ]),
        EtpBody::CommitTransaction(m) => {
            record(vec![("transactionUuid", uuid_value(&m.transaction_uuid))])
        }
        EtpBody::CommitTransactionResponse(m) => record(vec![
            ("transactionUuid", uuid_value(&m.transaction_uuid)),
            ("successful", Value::Boolean(m.successful)),
            ("failureReason", Value::String(m.failure_reason.clone())),
        ]),
        EtpBody::RollbackTransaction(m) => {
            record(vec![("transactionUuid", uuid_value(&m.transaction_uuid))])
        }
        EtpBody::RollbackTransactionResponse(m) => record(vec![
            ("transactionUuid", uuid_value(&m.transaction_uuid)),
            ("successful", Value::Boolean(m.successful)),
            ("failureReason", Value::String(m.failure_reason.clone())),
        ]),
        EtpBody::GetDataspaces(m) => record(vec![(
            "storeLastWriteFilter",
            nullable(m.store_last_write_filter.map(Value::Long)),
        )]),
        EtpBody::GetDataspacesResponse(m) => record(vec![(
            "dataspaces",
            Value::Array(m.dataspaces.iter().map(dataspace_value).collect()),
        )]),
        EtpBody::PutDataspaces(m) => {
            record(vec![("dataspaces", value_map(&m.dataspaces, dataspace_value))])
        }
        EtpBody::PutDataspacesResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::DeleteDataspaces(m) => record(vec![("uris", string_map(&m.uris))]),
        EtpBody::DeleteDataspacesResponse(m) => record(vec![("success", bool_map(&m.success))]),
        EtpBody::GetSupportedTypes(m) => record(vec![
            ("uri", Value::String(m.uri.clone())),
            ("scope", scope_value(m.scope)),
            ("returnEmptyTypes", Value::Boolean(m.return_empty_types)),
            ("countObjects", Value::Boolean(m.count_objects)),
        ]),
        EtpBody::GetSupportedTypesResponse(m) => record(vec![(
            "supportedTypes",
            Value::Array(
                m.supported_types
                    .iter()
                    .map(|t| {
                        record(vec![
                            ("dataObjectType", Value::String(t.data_object_type.clone())),
                            ("objectCount", nullable(t.object_count.map(Value::Int))),
                        ])
                    })
                    .collect(),
            ),
        )]),
    }
}

// ---------------------------------------------------------------------------
// Value → message bodies
// ---------------------------------------------------------------------------

pub(crate) fn body_from_value(
    protocol: i32,
    message_type: i32,
    value: Value,
) -> Result<EtpBody, CodecError> {
    use crate::messages::{core::msg as core_msg, dataarray::msg as da_msg, dataspace::msg as ds_msg, discovery::msg as disc_msg, store::msg as store_msg, supported_types::msg as st_msg, transaction::msg as tx_msg};

    let body = match (protocol, message_type) {
        (protocols::CORE, core_msg::REQUEST_SESSION) => {
            let mut f = Fields::from(value)?;
            EtpBody::RequestSession(RequestSession {
                application_name: as_string(f.take("applicationName")?)?,
                application_version: as_string(f.take("applicationVersion")?)?,
                client_instance_id: as_uuid(f.take("clientInstanceId")?)?,
                requested_protocols: as_array(f.take("requestedProtocols")?)?
                    .into_iter()
                    .map(supported_protocol_from)
                    .collect::<Result<_, _>>()?,
                supported_formats: string_vec(f.take("supportedFormats")?)?,
                current_date_time: as_i64(f.take("currentDateTime")?)?,
                endpoint_capabilities: data_value_map_from(f.take("endpointCapabilities")?)?,
            })
        }
        (protocols::CORE, core_msg::OPEN_SESSION) => {
            let mut f = Fields::from(value)?;
            EtpBody::OpenSession(OpenSession {
                application_name: as_string(f.take("applicationName")?)?,
                application_version: as_string(f.take("applicationVersion")?)?,
                server_instance_id: as_uuid(f.take("serverInstanceId")?)?,
                supported_protocols: as_array(f.take("supportedProtocols")?)?
                    .into_iter()
                    .map(supported_protocol_from)
                    .collect::<Result<_, _>>()?,
                supported_formats: string_vec(f.take("supportedFormats")?)?,
                session_id: as_uuid(f.take("sessionId")?)?,
                current_date_time: as_i64(f.take("currentDateTime")?)?,
                endpoint_capabilities: data_value_map_from(f.take("endpointCapabilities")?)?,
            })
        }
        (protocols::CORE, core_msg::CLOSE_SESSION) => {
            let mut f = Fields::from(value)?;
            EtpBody::CloseSession(CloseSession { reason: as_string(f.take("reason")?)? })
        }
        (protocols::CORE, core_msg::AUTHORIZE) => {
            let mut f = Fields::from(value)?;
            EtpBody::Authorize(Authorize {
                authorization: as_string(f.take("authorization")?)?,
                supplemental_authorization: string_btree(f.take("supplementalAuthorization")?)?,
            })
        }
        (protocols::CORE, core_msg::AUTHORIZE_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::AuthorizeResponse(AuthorizeResponse {
                success: as_bool(f.take("success")?)?,
                challenges: string_vec(f.take("challenges")?)?,
            })
        }
        (protocols::CORE, core_msg::PING) => {
            let mut f = Fields::from(value)?;
            EtpBody::Ping(Ping { current_date_time: as_i64(f.take("currentDateTime")?)? })
        }
        (protocols::CORE, core_msg::PONG) => {
            let mut f = Fields::from(value)?;
            EtpBody::Pong(Pong { current_date_time: as_i64(f.take("currentDateTime")?)? })
        }
        (protocols::CORE, core_msg::PROTOCOL_EXCEPTION) => {
            let mut f = Fields::from(value)?;
            EtpBody::ProtocolException(ProtocolException {
                code: as_i32(f.take("code")?)?,
                message: as_string(f.take("message")?)?,
            })
        }
        (protocols::CORE, core_msg::ACKNOWLEDGE) => EtpBody::Acknowledge(Acknowledge),
        (protocols::DISCOVERY, disc_msg::GET_RESOURCES) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetResources(GetResources {
                uri: as_string(f.take("uri")?)?,
                depth: as_i32(f.take("depth")?)?,
                scope: scope_from(f.take("scope")?)?,
                count_objects: as_bool(f.take("countObjects")?)?,
                store_last_write_filter: optional(f.take("storeLastWriteFilter")?)
                    .map(as_i64)
                    .transpose()?,
                active_status_filter: optional(f.take("activeStatusFilter")?)
                    .map(active_status_from)
                    .transpose()?,
                include_edges: as_bool(f.take("includeEdges")?)?,
            })
        }
        (protocols::DISCOVERY, disc_msg::GET_RESOURCES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetResourcesResponse(GetResourcesResponse {
                resources: as_array(f.take("resources")?)?
                    .into_iter()
                    .map(resource_from)
                    .collect::<Result<_, _>>()?,
            })
        }
        (protocols::DISCOVERY, disc_msg::GET_RESOURCES_EDGES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetResourcesEdgesResponse(GetResourcesEdgesResponse {
                edges: as_array(f.take("edges")?)?
                    .into_iter()
                    .map(|v| {
                        let mut ef = Fields::from(v)?;
                        Ok(Edge {
                            source_uri: as_string(ef.take("sourceUri")?)?,
                            target_uri: as_string(ef.take("targetUri")?)?,
                        })
                    })
                    .collect::<Result<_, CodecError>>()?,
            })
        }
        (protocols::STORE, store_msg::GET_DATA_OBJECTS) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataObjects(GetDataObjects {
                uris: string_btree(f.take("uris")?)?,
                format: as_string(f.take("format")?)?,
            })
        }
        (protocols::STORE, store_msg::GET_DATA_OBJECTS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataObjectsResponse(GetDataObjectsResponse {
                data_objects: btree_of(f.take("dataObjects")?, data_object_from)?,
            })
        }
        (protocols::STORE, store_msg::PUT_DATA_OBJECTS) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataObjects(PutDataObjects {
                data_objects: btree_of(f.take("dataObjects")?, data_object_from)?,
                prune_contained_objects: as_bool(f.take("pruneContainedObjects")?)?,
            })
        }
        (protocols::STORE, store_msg::PUT_DATA_OBJECTS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataObjectsResponse(PutDataObjectsResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::STORE, store_msg::DELETE_DATA_OBJECTS) => {
            let mut f = Fields::from(value)?;
            EtpBody::DeleteDataObjects(DeleteDataObjects {
                uris: string_btree(f.take("uris")?)?,
                prune_contained_objects: as_bool(f.take("pruneContainedObjects")?)?,
            })
        }
        (protocols::STORE, store_msg::DELETE_DATA_OBJECTS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::DeleteDataObjectsResponse(DeleteDataObjectsResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::STORE, store_msg::CHUNK) => {
            let mut f = Fields::from(value)?;
            EtpBody::Chunk(Chunk {
                blob_id: as_uuid(f.take("blobId")?)?,
                data: as_bytes(f.take("data")?)?,
                final_chunk: as_bool(f.take("final")?)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_ARRAYS) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataArrays(GetDataArrays {
                data_arrays: btree_of(f.take("dataArrays")?, identifier_from)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_ARRAYS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataArraysResponse(GetDataArraysResponse {
                data_arrays: btree_of(f.take("dataArrays")?, data_array_from)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::PUT_DATA_ARRAYS) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataArrays(PutDataArrays {
                data_arrays: btree_of(f.take("dataArrays")?, |v| {
                    let mut tf = Fields::from(v)?;
                    Ok(PutDataArraysType {
                        uid: identifier_from(tf.take("uid")?)?,
                        array: data_array_from(tf.take("array")?)?,
                    })
                })?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::PUT_DATA_ARRAYS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataArraysResponse(PutDataArraysResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_ARRAY_METADATA) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataArrayMetadata(GetDataArrayMetadata {
                data_arrays: btree_of(f.take("dataArrays")?, identifier_from)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_ARRAY_METADATA_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataArrayMetadataResponse(GetDataArrayMetadataResponse {
                array_metadata: btree_of(f.take("arrayMetadata")?, metadata_from)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_SUBARRAYS) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataSubarrays(GetDataSubarrays {
                data_subarrays: btree_of(f.take("dataSubarrays")?, |v| {
                    let mut tf = Fields::from(v)?;
                    Ok(GetDataSubarraysType {
                        uid: identifier_from(tf.take("uid")?)?,
                        starts: long_vec(tf.take("starts")?)?,
                        counts: long_vec(tf.take("counts")?)?,
                    })
                })?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::GET_DATA_SUBARRAYS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataSubarraysResponse(GetDataSubarraysResponse {
                data_subarrays: btree_of(f.take("dataSubarrays")?, data_array_from)?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::PUT_DATA_SUBARRAYS) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataSubarrays(PutDataSubarrays {
                data_subarrays: btree_of(f.take("dataSubarrays")?, |v| {
                    let mut tf = Fields::from(v)?;
                    Ok(PutDataSubarraysType {
                        uid: identifier_from(tf.take("uid")?)?,
                        data: any_array_from(tf.take("data")?)?,
                        starts: long_vec(tf.take("starts")?)?,
                        counts: long_vec(tf.take("counts")?)?,
                    })
                })?,
            })
        }
        (protocols::DATA_ARRAY, da_msg::PUT_DATA_SUBARRAYS_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataSubarraysResponse(PutDataSubarraysResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::START_TRANSACTION) => {
            let mut f = Fields::from(value)?;
            EtpBody::StartTransaction(StartTransaction {
                dataspace_uris: string_vec(f.take("dataspaceUris")?)?,
                read_only: as_bool(f.take("readOnly")?)?,
                message: as_string(f.take("message")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::START_TRANSACTION_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::StartTransactionResponse(StartTransactionResponse {
                transaction_uuid: as_uuid(f.take("transactionUuid")?)?,
                successful: as_bool(f.take("successful")?)?,
                failure_reason: as_string(f.take("failureReason")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::COMMIT_TRANSACTION) => {
            let mut f = Fields::from(value)?;
            EtpBody::CommitTransaction(CommitTransaction {
                transaction_uuid: as_uuid(f.take("transactionUuid")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::COMMIT_TRANSACTION_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::CommitTransactionResponse(CommitTransactionResponse {
                transaction_uuid: as_uuid(f.take("transactionUuid")?)?,
                successful: as_bool(f.take("successful")?)?,
                failure_reason: as_string(f.take("failureReason")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::ROLLBACK_TRANSACTION) => {
            let mut f = Fields::from(value)?;
            EtpBody::RollbackTransaction(RollbackTransaction {
                transaction_uuid: as_uuid(f.take("transactionUuid")?)?,
            })
        }
        (protocols::TRANSACTION, tx_msg::ROLLBACK_TRANSACTION_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::RollbackTransactionResponse(RollbackTransactionResponse {
                transaction_uuid: as_uuid(f.take("transactionUuid")?)?,
                successful: as_bool(f.take("successful")?)?,
                failure_reason: as_string(f.take("failureReason")?)?,
            })
        }
        (protocols::DATASPACE, ds_msg::GET_DATASPACES) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataspaces(GetDataspaces {
                store_last_write_filter: optional(f.take("storeLastWriteFilter")?)
                    .map(as_i64)
                    .transpose()?,
            })
        }
        (protocols::DATASPACE, ds_msg::GET_DATASPACES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetDataspacesResponse(GetDataspacesResponse {
                dataspaces: as_array(f.take("dataspaces")?)?
                    .into_iter()
                    .map(dataspace_from)
                    .collect::<Result<_, _>>()?,
            })
        }
        (protocols::DATASPACE, ds_msg::PUT_DATASPACES) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataspaces(PutDataspaces {
                dataspaces: btree_of(f.take("dataspaces")?, dataspace_from)?,
            })
        }
        (protocols::DATASPACE, ds_msg::PUT_DATASPACES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::PutDataspacesResponse(PutDataspacesResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::DATASPACE, ds_msg::DELETE_DATASPACES) => {
            let mut f = Fields::from(value)?;
            EtpBody::DeleteDataspaces(DeleteDataspaces { uris: string_btree(f.take("uris")?)? })
        }
        (protocols::DATASPACE, ds_msg::DELETE_DATASPACES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::DeleteDataspacesResponse(DeleteDataspacesResponse {
                success: bool_btree(f.take("success")?)?,
            })
        }
        (protocols::SUPPORTED_TYPES, st_msg::GET_SUPPORTED_TYPES) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetSupportedTypes(GetSupportedTypes {
                uri: as_string(f.take("uri")?)?,
                scope: scope_from(f.take("scope")?)?,
                return_empty_types: as_bool(f.take("returnEmptyTypes")?)?,
                count_objects: as_bool(f.take("countObjects")?)?,
            })
        }
        (protocols::SUPPORTED_TYPES, st_msg::GET_SUPPORTED_TYPES_RESPONSE) => {
            let mut f = Fields::from(value)?;
            EtpBody::GetSupportedTypesResponse(GetSupportedTypesResponse {
                supported_types: as_array(f.take("supportedTypes")?)?
                    .into_iter()
                    .map(|v| {
                        let mut tf = Fields::from(v)?;
                        Ok(SupportedType {
                            data_object_type: as_string(tf.take("dataObjectType")?)?,
                            object_count: optional(tf.take("objectCount")?).map(as_i32).transpose()?,
                        })
                    })
                    .collect::<Result<_, CodecError>>()?,
            })
        }
        _ => return Err(CodecError::UnknownMessageType { protocol, message_type }),
    };
    Ok(body)
}
