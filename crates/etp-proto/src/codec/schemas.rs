//! Embedded Avro schema set.
//!
//! The `.avsc` documents under `schemas/` are the IDL-generated schema
//! subset this client speaks; each is self-contained and parsed once on
//! first use.

use std::sync::LazyLock;

use apache_avro::Schema;

use crate::messages::{core, dataarray, dataspace, discovery, store, supported_types, transaction};
use crate::protocols;

fn parse(source: &str) -> Schema {
    Schema::parse_str(source).expect("embedded schema is valid")
}

macro_rules! embedded_schema {
    ($name:ident, $file:literal) => {
        pub(crate) static $name: LazyLock<Schema> =
            LazyLock::new(|| parse(include_str!(concat!("../../schemas/", $file))));
    };
}

embedded_schema!(MESSAGE_HEADER, "MessageHeader.avsc");

embedded_schema!(REQUEST_SESSION, "RequestSession.avsc");
embedded_schema!(OPEN_SESSION, "OpenSession.avsc");
embedded_schema!(CLOSE_SESSION, "CloseSession.avsc");
embedded_schema!(AUTHORIZE, "Authorize.avsc");
embedded_schema!(AUTHORIZE_RESPONSE, "AuthorizeResponse.avsc");
embedded_schema!(PING, "Ping.avsc");
embedded_schema!(PONG, "Pong.avsc");
embedded_schema!(PROTOCOL_EXCEPTION, "ProtocolException.avsc");
embedded_schema!(ACKNOWLEDGE, "Acknowledge.avsc");

embedded_schema!(GET_RESOURCES, "GetResources.avsc");
embedded_schema!(GET_RESOURCES_RESPONSE, "GetResourcesResponse.avsc");
embedded_schema!(GET_RESOURCES_EDGES_RESPONSE, "GetResourcesEdgesResponse.avsc");

embedded_schema!(GET_DATA_OBJECTS, "GetDataObjects.avsc");
embedded_schema!(GET_DATA_OBJECTS_RESPONSE, "GetDataObjectsResponse.avsc");
embedded_schema!(PUT_DATA_OBJECTS, "PutDataObjects.avsc");
embedded_schema!(PUT_DATA_OBJECTS_RESPONSE, "PutDataObjectsResponse.avsc");
embedded_schema!(DELETE_DATA_OBJECTS, "DeleteDataObjects.avsc");
embedded_schema!(DELETE_DATA_OBJECTS_RESPONSE, "DeleteDataObjectsResponse.avsc");
embedded_schema!(CHUNK, "Chunk.avsc");

embedded_schema!(GET_DATA_ARRAYS, "GetDataArrays.avsc");
embedded_schema!(GET_DATA_ARRAYS_RESPONSE, "GetDataArraysResponse.avsc");
embedded_schema!(PUT_DATA_ARRAYS, "PutDataArrays.avsc");
embedded_schema!(PUT_DATA_ARRAYS_RESPONSE, "PutDataArraysResponse.avsc");
embedded_schema!(GET_DATA_ARRAY_METADATA, "GetDataArrayMetadata.avsc");
embedded_schema!(GET_DATA_ARRAY_METADATA_RESPONSE, "GetDataArrayMetadataResponse.avsc");
embedded_schema!(GET_DATA_SUBARRAYS, "GetDataSubarrays.avsc");
embedded_schema!(GET_DATA_SUBARRAYS_RESPONSE, "GetDataSubarraysResponse.avsc");
embedded_schema!(PUT_DATA_SUBARRAYS, "PutDataSubarrays.avsc");
embedded_schema!(PUT_DATA_SUBARRAYS_RESPONSE, "PutDataSubarraysResponse.avsc");

embedded_schema!(START_TRANSACTION, "StartTransaction.avsc");
embedded_schema!(START_TRANSACTION_RESPONSE, "StartTransactionResponse.avsc");
embedded_schema!(COMMIT_TRANSACTION, "CommitTransaction.avsc");
embedded_schema!(COMMIT_TRANSACTION_RESPONSE, "CommitTransactionResponse.avsc");
embedded_schema!(ROLLBACK_TRANSACTION, "RollbackTransaction.avsc");
embedded_schema!(ROLLBACK_TRANSACTION_RESPONSE, "RollbackTransactionResponse.avsc");

embedded_schema!(GET_DATASPACES, "GetDataspaces.avsc");
embedded_schema!(GET_DATASPACES_RESPONSE, "GetDataspacesResponse.avsc");
embedded_schema!(PUT_DATASPACES, "PutDataspaces.avsc");
embedded_schema!(PUT_DATASPACES_RESPONSE, "PutDataspacesResponse.avsc");
embedded_schema!(DELETE_DATASPACES, "DeleteDataspaces.avsc");
embedded_schema!(DELETE_DATASPACES_RESPONSE, "DeleteDataspacesResponse.avsc");

embedded_schema!(GET_SUPPORTED_TYPES, "GetSupportedTypes.avsc");
embedded_schema!(GET_SUPPORTED_TYPES_RESPONSE, "GetSupportedTypesResponse.avsc");

/// Body schema for a `(protocol, message_type)` discriminant, or `None`
/// for pairs this client does not implement.
pub(crate) fn body_schema(protocol: i32, message_type: i32) -> Option<&'static Schema> {
    let schema: &'static Schema = match (protocol, message_type) {
        (protocols::CORE, core::msg::REQUEST_SESSION) => &REQUEST_SESSION,
        (protocols::CORE, core::msg::OPEN_SESSION) => &OPEN_SESSION,
        (protocols::CORE, core::msg::CLOSE_SESSION) => &CLOSE_SESSION,
        (protocols::CORE, core::msg::AUTHORIZE) => &AUTHORIZE,
        (protocols::CORE, core::msg::AUTHORIZE_RESPONSE) => &AUTHORIZE_RESPONSE,
        (protocols::CORE, core::msg::PING) => &PING,
        (protocols::CORE, core::msg::PONG) => &PONG,
        (protocols::CORE, core::msg::PROTOCOL_EXCEPTION) => &PROTOCOL_EXCEPTION,
        (protocols::CORE, core::msg::ACKNOWLEDGE) => &ACKNOWLEDGE,
        (protocols::DISCOVERY, discovery::msg::GET_RESOURCES) => &GET_RESOURCES,
        (protocols::DISCOVERY, discovery::msg::GET_RESOURCES_RESPONSE) => &GET_RESOURCES_RESPONSE,
        (protocols::DISCOVERY, discovery::msg::GET_RESOURCES_EDGES_RESPONSE) => {
            &GET_RESOURCES_EDGES_RESPONSE
        }
        (protocols::STORE, store::msg::GET_DATA_OBJECTS) => &GET_DATA_OBJECTS,
        (protocols::STORE, store::msg::GET_DATA_OBJECTS_RESPONSE) => &GET_DATA_OBJECTS_RESPONSE,
        (protocols::STORE, store::msg::PUT_DATA_OBJECTS) => &PUT_DATA_OBJECTS,
        (protocols::STORE, store::msg::PUT_DATA_OBJECTS_RESPONSE) => &PUT_DATA_OBJECTS_RESPONSE,
        (protocols::STORE, store::msg::DELETE_DATA_OBJECTS) => &DELETE_DATA_OBJECTS,
        (protocols::STORE, store::msg::DELETE_DATA_OBJECTS_RESPONSE) => {
            &DELETE_DATA_OBJECTS_RESPONSE
        }
        (protocols::STORE, store::msg::CHUNK) => &CHUNK,
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAYS) => &GET_DATA_ARRAYS,
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAYS_RESPONSE) => {
            &GET_DATA_ARRAYS_RESPONSE
        }
        (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_ARRAYS) => &PUT_DATA_ARRAYS,
        (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_ARRAYS_RESPONSE) => {
            &PUT_DATA_ARRAYS_RESPONSE
        }
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAY_METADATA) => {
            &GET_DATA_ARRAY_METADATA
        }
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAY_METADATA_RESPONSE) => {
            &GET_DATA_ARRAY_METADATA_RESPONSE
        }
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_SUBARRAYS) => &GET_DATA_SUBARRAYS,
        (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_SUBARRAYS_RESPONSE) => {
            &GET_DATA_SUBARRAYS_RESPONSE
        }
        (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_SUBARRAYS) => &PUT_DATA_SUBARRAYS,
        (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_SUBARRAYS_RESPONSE) => {
            &PUT_DATA_SUBARRAYS_RESPONSE
        }
        (protocols::TRANSACTION, transaction::msg::START_TRANSACTION) => &START_TRANSACTION,
        (protocols::TRANSACTION, transaction::msg::START_TRANSACTION_RESPONSE) => {
            &START_TRANSACTION_RESPONSE
        }
        (protocols::TRANSACTION, transaction::msg::COMMIT_TRANSACTION) => &COMMIT_TRANSACTION,
        (protocols::TRANSACTION, transaction::msg::COMMIT_TRANSACTION_RESPONSE) => {
            &COMMIT_TRANSACTION_RESPONSE
        }
        (protocols::TRANSACTION, transaction::msg::ROLLBACK_TRANSACTION) => &ROLLBACK_TRANSACTION,
        (protocols::TRANSACTION, transaction::msg::ROLLBACK_TRANSACTION_RESPONSE) => {
            &ROLLBACK_TRANSACTION_RESPONSE
        }
        (protocols::DATASPACE, dataspace::msg::GET_DATASPACES) => &GET_DATASPACES,
        (protocols::DATASPACE, dataspace::msg::GET_DATASPACES_RESPONSE) => {
            &GET_DATASPACES_RESPONSE
        }
        (protocols::DATASPACE, dataspace::msg::PUT_DATASPACES) => &PUT_DATASPACES,
        (protocols::DATASPACE, dataspace::msg::PUT_DATASPACES_RESPONSE) => {
            &PUT_DATASPACES_RESPONSE
        }
        (protocols::DATASPACE, dataspace::msg::DELETE_DATASPACES) => &DELETE_DATASPACES,
        (protocols::DATASPACE, dataspace::msg::DELETE_DATASPACES_RESPONSE) => {
            &DELETE_DATASPACES_RESPONSE
        }
        (protocols::SUPPORTED_TYPES, supported_types::msg::GET_SUPPORTED_TYPES) => {
            &GET_SUPPORTED_TYPES
        }
        (protocols::SUPPORTED_TYPES, supported_types::msg::GET_SUPPORTED_TYPES_RESPONSE) => {
            &GET_SUPPORTED_TYPES_RESPONSE
        }
        _ => return None,
    };
    Some(schema)
}
