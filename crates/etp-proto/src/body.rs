//! The exhaustive message-body sum type.
//!
//! `EtpBody` replaces runtime handler registration with a static dispatch
//! table: every body knows its `(protocol, message_type)` pair, and the
//! codec decodes inbound frames through an exhaustive match on that pair.

use crate::messages::core::{self, Acknowledge, Authorize, AuthorizeResponse, CloseSession, OpenSession, Ping, Pong, ProtocolException, RequestSession};
use crate::messages::dataarray::{self, GetDataArrayMetadata, GetDataArrayMetadataResponse, GetDataArrays, GetDataArraysResponse, GetDataSubarrays, GetDataSubarraysResponse, PutDataArrays, PutDataArraysResponse, PutDataSubarrays, PutDataSubarraysResponse};
use crate::messages::dataspace::{self, DeleteDataspaces, DeleteDataspacesResponse, GetDataspaces, GetDataspacesResponse, PutDataspaces, PutDataspacesResponse};
use crate::messages::discovery::{self, GetResources, GetResourcesEdgesResponse, GetResourcesResponse};
use crate::messages::store::{self, Chunk, DeleteDataObjects, DeleteDataObjectsResponse, GetDataObjects, GetDataObjectsResponse, PutDataObjects, PutDataObjectsResponse};
use crate::messages::supported_types::{self, GetSupportedTypes, GetSupportedTypesResponse};
use crate::messages::transaction::{self, CommitTransaction, CommitTransactionResponse, RollbackTransaction, RollbackTransactionResponse, StartTransaction, StartTransactionResponse};
use crate::protocols;

/// Every message body this client can send or receive.
#[derive(Debug, Clone, PartialEq)]
pub enum EtpBody {
    // Core (0)
    RequestSession(RequestSession),
    OpenSession(OpenSession),
    CloseSession(CloseSession),
    Authorize(Authorize),
    AuthorizeResponse(AuthorizeResponse),
    Ping(Ping),
    Pong(Pong),
    ProtocolException(ProtocolException),
    Acknowledge(Acknowledge),
    // Discovery (3)
    GetResources(GetResources),
    GetResourcesResponse(GetResourcesResponse),
    GetResourcesEdgesResponse(GetResourcesEdgesResponse),
    // Store (4)
    GetDataObjects(GetDataObjects),
    GetDataObjectsResponse(GetDataObjectsResponse),
    PutDataObjects(PutDataObjects),
    PutDataObjectsResponse(PutDataObjectsResponse),
    DeleteDataObjects(DeleteDataObjects),
    DeleteDataObjectsResponse(DeleteDataObjectsResponse),
    Chunk(Chunk),
    // DataArray (9)
    GetDataArrays(GetDataArrays),
    GetDataArraysResponse(GetDataArraysResponse),
    PutDataArrays(PutDataArrays),
    PutDataArraysResponse(PutDataArraysResponse),
    GetDataArrayMetadata(GetDataArrayMetadata),
    GetDataArrayMetadataResponse(GetDataArrayMetadataResponse),
    GetDataSubarrays(GetDataSubarrays),
    GetDataSubarraysResponse(GetDataSubarraysResponse),
    PutDataSubarrays(PutDataSubarrays),
    PutDataSubarraysResponse(PutDataSubarraysResponse),
    // Transaction (18)
    StartTransaction(StartTransaction),
    StartTransactionResponse(StartTransactionResponse),
    CommitTransaction(CommitTransaction),
    CommitTransactionResponse(CommitTransactionResponse),
    RollbackTransaction(RollbackTransaction),
    RollbackTransactionResponse(RollbackTransactionResponse),
    // Dataspace (24)
    GetDataspaces(GetDataspaces),
    GetDataspacesResponse(GetDataspacesResponse),
    PutDataspaces(PutDataspaces),
    PutDataspacesResponse(PutDataspacesResponse),
    DeleteDataspaces(DeleteDataspaces),
    DeleteDataspacesResponse(DeleteDataspacesResponse),
    // SupportedTypes (25)
    GetSupportedTypes(GetSupportedTypes),
    GetSupportedTypesResponse(GetSupportedTypesResponse),
}

impl EtpBody {
    /// The `(protocol, message_type)` discriminant stamped into the header.
    pub fn discriminant(&self) -> (i32, i32) {
        match self {
            EtpBody::RequestSession(_) => (protocols::CORE, core::msg::REQUEST_SESSION),
            EtpBody::OpenSession(_) => (protocols::CORE, core::msg::OPEN_SESSION),
            EtpBody::CloseSession(_) => (protocols::CORE, core::msg::CLOSE_SESSION),
            EtpBody::Authorize(_) => (protocols::CORE, core::msg::AUTHORIZE),
            EtpBody::AuthorizeResponse(_) => (protocols::CORE, core::msg::AUTHORIZE_RESPONSE),
            EtpBody::Ping(_) => (protocols::CORE, core::msg::PING),
            EtpBody::Pong(_) => (protocols::CORE, core::msg::PONG),
            EtpBody::ProtocolException(_) => (protocols::CORE, core::msg::PROTOCOL_EXCEPTION),
            EtpBody::Acknowledge(_) => (protocols::CORE, core::msg::ACKNOWLEDGE),
            EtpBody::GetResources(_) => (protocols::DISCOVERY, discovery::msg::GET_RESOURCES),
            EtpBody::GetResourcesResponse(_) => (protocols::DISCOVERY, discovery::msg::GET_RESOURCES_RESPONSE),
            EtpBody::GetResourcesEdgesResponse(_) => {
                (protocols::DISCOVERY, discovery::msg::GET_RESOURCES_EDGES_RESPONSE)
            }
            EtpBody::GetDataObjects(_) => (protocols::STORE, store::msg::GET_DATA_OBJECTS),
            EtpBody::GetDataObjectsResponse(_) => (protocols::STORE, store::msg::GET_DATA_OBJECTS_RESPONSE),
            EtpBody::PutDataObjects(_) => (protocols::STORE, store::msg::PUT_DATA_OBJECTS),
            EtpBody::PutDataObjectsResponse(_) => (protocols::STORE, store::msg::PUT_DATA_OBJECTS_RESPONSE),
            EtpBody::DeleteDataObjects(_) => (protocols::STORE, store::msg::DELETE_DATA_OBJECTS),
            EtpBody::DeleteDataObjectsResponse(_) => {
                (protocols::STORE, store::msg::DELETE_DATA_OBJECTS_RESPONSE)
            }
            EtpBody::Chunk(_) => (protocols::STORE, store::msg::CHUNK),
            EtpBody::GetDataArrays(_) => (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAYS),
            EtpBody::GetDataArraysResponse(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAYS_RESPONSE)
            }
            EtpBody::PutDataArrays(_) => (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_ARRAYS),
            EtpBody::PutDataArraysResponse(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_ARRAYS_RESPONSE)
            }
            EtpBody::GetDataArrayMetadata(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAY_METADATA)
            }
            EtpBody::GetDataArrayMetadataResponse(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_ARRAY_METADATA_RESPONSE)
            }
            EtpBody::GetDataSubarrays(_) => (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_SUBARRAYS),
            EtpBody::GetDataSubarraysResponse(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::GET_DATA_SUBARRAYS_RESPONSE)
            }
            EtpBody::PutDataSubarrays(_) => (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_SUBARRAYS),
            EtpBody::PutDataSubarraysResponse(_) => {
                (protocols::DATA_ARRAY, dataarray::msg::PUT_DATA_SUBARRAYS_RESPONSE)
            }
            EtpBody::StartTransaction(_) => (protocols::TRANSACTION, transaction::msg::START_TRANSACTION),
            EtpBody::StartTransactionResponse(_) => {
                (protocols::TRANSACTION, transaction::msg::START_TRANSACTION_RESPONSE)
            }
            EtpBody::CommitTransaction(_) => (protocols::TRANSACTION, transaction::msg::COMMIT_TRANSACTION),
            EtpBody::CommitTransactionResponse(_) => {
                (protocols::TRANSACTION, transaction::msg::COMMIT_TRANSACTION_RESPONSE)
            }
            EtpBody::RollbackTransaction(_) => {
                (protocols::TRANSACTION, transaction::msg::ROLLBACK_TRANSACTION)
            }
            EtpBody::RollbackTransactionResponse(_) => {
                (protocols::TRANSACTION, transaction::msg::ROLLBACK_TRANSACTION_RESPONSE)
            }
            EtpBody::GetDataspaces(_) => (protocols::DATASPACE, dataspace::msg::GET_DATASPACES),
            EtpBody::GetDataspacesResponse(_) => {
                (protocols::DATASPACE, dataspace::msg::GET_DATASPACES_RESPONSE)
            }
            EtpBody::PutDataspaces(_) => (protocols::DATASPACE, dataspace::msg::PUT_DATASPACES),
            EtpBody::PutDataspacesResponse(_) => {
                (protocols::DATASPACE, dataspace::msg::PUT_DATASPACES_RESPONSE)
            }
            EtpBody::DeleteDataspaces(_) => (protocols::DATASPACE, dataspace::msg::DELETE_DATASPACES),
            EtpBody::DeleteDataspacesResponse(_) => {
                (protocols::DATASPACE, dataspace::msg::DELETE_DATASPACES_RESPONSE)
            }
            EtpBody::GetSupportedTypes(_) => {
                (protocols::SUPPORTED_TYPES, supported_types::msg::GET_SUPPORTED_TYPES)
            }
            EtpBody::GetSupportedTypesResponse(_) => {
                (protocols::SUPPORTED_TYPES, supported_types::msg::GET_SUPPORTED_TYPES_RESPONSE)
            }
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            EtpBody::RequestSession(_) => "RequestSession",
            EtpBody::OpenSession(_) => "OpenSession",
            EtpBody::CloseSession(_) => "CloseSession",
            EtpBody::Authorize(_) => "Authorize",
            EtpBody::AuthorizeResponse(_) => "AuthorizeResponse",
            EtpBody::Ping(_) => "Ping",
            EtpBody::Pong(_) => "Pong",
            EtpBody::ProtocolException(_) => "ProtocolException",
            EtpBody::Acknowledge(_) => "Acknowledge",
            EtpBody::GetResources(_) => "GetResources",
            EtpBody::GetResourcesResponse(_) => "GetResourcesResponse",
            EtpBody::GetResourcesEdgesResponse(_) => "GetResourcesEdgesResponse",
            EtpBody::GetDataObjects(_) => "GetDataObjects",
            EtpBody::GetDataObjectsResponse(_) => "GetDataObjectsResponse",
            EtpBody::PutDataObjects(_) => "PutDataObjects",
            EtpBody::PutDataObjectsResponse(_) => "PutDataObjectsResponse",
            EtpBody::DeleteDataObjects(_) => "DeleteDataObjects",
            EtpBody::DeleteDataObjectsResponse(_) => "DeleteDataObjectsResponse",
            EtpBody::Chunk(_) => "Chunk",
            EtpBody::GetDataArrays(_) => "GetDataArrays",
            EtpBody::GetDataArraysResponse(_) => "GetDataArraysResponse",
            EtpBody::PutDataArrays(_) => "PutDataArrays",
            EtpBody::PutDataArraysResponse(_) => "PutDataArraysResponse",
            EtpBody::GetDataArrayMetadata(_) => "GetDataArrayMetadata",
            EtpBody::GetDataArrayMetadataResponse(_) => "GetDataArrayMetadataResponse",
            EtpBody::GetDataSubarrays(_) => "GetDataSubarrays",
            EtpBody::GetDataSubarraysResponse(_) => "GetDataSubarraysResponse",
            EtpBody::PutDataSubarrays(_) => "PutDataSubarrays",
            EtpBody::PutDataSubarraysResponse(_) => "PutDataSubarraysResponse",
            EtpBody::StartTransaction(_) => "StartTransaction",
            EtpBody::StartTransactionResponse(_) => "StartTransactionResponse",
            EtpBody::CommitTransaction(_) => "CommitTransaction",
            EtpBody::CommitTransactionResponse(_) => "CommitTransactionResponse",
            EtpBody::RollbackTransaction(_) => "RollbackTransaction",
            EtpBody::RollbackTransactionResponse(_) => "RollbackTransactionResponse",
            EtpBody::GetDataspaces(_) => "GetDataspaces",
            EtpBody::GetDataspacesResponse(_) => "GetDataspacesResponse",
            EtpBody::PutDataspaces(_) => "PutDataspaces",
            EtpBody::PutDataspacesResponse(_) => "PutDataspacesResponse",
            EtpBody::DeleteDataspaces(_) => "DeleteDataspaces",
            EtpBody::DeleteDataspacesResponse(_) => "DeleteDataspacesResponse",
            EtpBody::GetSupportedTypes(_) => "GetSupportedTypes",
            EtpBody::GetSupportedTypesResponse(_) => "GetSupportedTypesResponse",
        }
    }
}
