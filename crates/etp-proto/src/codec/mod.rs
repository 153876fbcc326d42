//! The codec adapter: one message (header + body) to and from bytes.
//!
//! A frame is the Avro datum of [`MessageHeader`] immediately followed by
//! the Avro datum of the body (or a slice of it, for byte-split
//! messages).  The adapter is purely syntactic: it selects the body schema
//! by the `(protocol, messageType)` discriminant and never interprets
//! fields.

mod convert;
mod schemas;

use apache_avro::types::Value;
use apache_avro::{from_avro_datum, to_avro_datum};

use crate::body::EtpBody;
use crate::error::CodecError;
use crate::header::{MessageFlags, MessageHeader};

/// Encode a header to its Avro datum.
pub fn encode_header(header: &MessageHeader) -> Result<Vec<u8>, CodecError> {
    let value = Value::Record(vec![
        ("protocol".to_owned(), Value::Int(header.protocol)),
        ("messageType".to_owned(), Value::Int(header.message_type)),
        ("correlationId".to_owned(), Value::Long(header.correlation_id)),
        ("messageId".to_owned(), Value::Long(header.message_id)),
        ("messageFlags".to_owned(), Value::Int(header.message_flags.bits())),
    ]);
    Ok(to_avro_datum(&schemas::MESSAGE_HEADER, value)?)
}

/// Decode a header from the front of a frame, advancing `reader` past it.
pub fn decode_header(reader: &mut &[u8]) -> Result<MessageHeader, CodecError> {
    let value = from_avro_datum(&schemas::MESSAGE_HEADER, reader, None)?;
    let Value::Record(fields) = value else {
        return Err(CodecError::format("header is not a record"));
    };
    let mut protocol = 0;
    let mut message_type = 0;
    let mut correlation_id = 0;
    let mut message_id = 0;
    let mut flags = 0;
    for (name, value) in fields {
        match (name.as_str(), value) {
            ("protocol", Value::Int(v)) => protocol = v,
            ("messageType", Value::Int(v)) => message_type = v,
            ("correlationId", Value::Long(v)) => correlation_id = v,
            ("messageId", Value::Long(v)) => message_id = v,
            ("messageFlags", Value::Int(v)) => flags = v,
            (name, value) => {
                return Err(CodecError::format(format!("bad header field {name}: {value:?}")));
            }
        }
    }
    Ok(MessageHeader {
        protocol,
        message_type,
        correlation_id,
        message_id,
        message_flags: MessageFlags(flags),
    })
}

/// Encode a body to its Avro datum.
pub fn encode_body(body: &EtpBody) -> Result<Vec<u8>, CodecError> {
    let (protocol, message_type) = body.discriminant();
    let schema = schemas::body_schema(protocol, message_type)
        .ok_or(CodecError::UnknownMessageType { protocol, message_type })?;
    Ok(to_avro_datum(schema, convert::body_to_value(body))?)
}

/// Decode a body from its complete (reassembled) Avro datum.
pub fn decode_body(
    protocol: i32,
    message_type: i32,
    bytes: &[u8],
) -> Result<EtpBody, CodecError> {
    let schema = schemas::body_schema(protocol, message_type)
        .ok_or(CodecError::UnknownMessageType { protocol, message_type })?;
    let mut reader = bytes;
    let value = from_avro_datum(schema, &mut reader, None)?;
    if !reader.is_empty() {
        return Err(CodecError::format(format!("{} trailing bytes after body", reader.len())));
    }
    convert::body_from_value(protocol, message_type, value)
}

/// Encode a complete single-frame message.
pub fn encode_message(header: &MessageHeader, body: &EtpBody) -> Result<Vec<u8>, CodecError> {
    let mut frame = encode_header(header)?;
    frame.extend(encode_body(body)?);
    Ok(frame)
}

/// Decode a complete single-frame message.
pub fn decode_message(bytes: &[u8]) -> Result<(MessageHeader, EtpBody), CodecError> {
    let mut reader = bytes;
    let header = decode_header(&mut reader)?;
    let body = decode_body(header.protocol, header.message_type, reader)?;
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use uuid::Uuid;

    use super::*;
    use crate::arrays::{AnyArray, AnyArrayType};
    use crate::messages::core::*;
    use crate::messages::dataarray::*;
    use crate::messages::dataspace::*;
    use crate::messages::discovery::*;
    use crate::messages::store::*;
    use crate::messages::supported_types::*;
    use crate::messages::transaction::*;
    use crate::messages::{ActiveStatusKind, ContextScopeKind, DataValue};
    use crate::protocols;

    fn round_trip(body: EtpBody) {
        let (protocol, message_type) = body.discriminant();
        let header = MessageHeader::new(protocol, message_type, 2, 0);
        let frame = encode_message(&header, &body).unwrap();
        let (decoded_header, decoded_body) = decode_message(&frame).unwrap();
        assert_eq!(decoded_header, header);
        assert_eq!(decoded_body, body);
    }

    fn sample_resource(uri: &str) -> Resource {
        Resource {
            uri: uri.to_owned(),
            name: "Thym".to_owned(),
            source_count: Some(2),
            target_count: None,
            last_changed: 1_700_000_000_000_000,
            store_last_write: 1_700_000_000_000_001,
            active_status: ActiveStatusKind::Active,
        }
    }

    #[test]
    fn header_round_trip_preserves_every_field() {
        let header = MessageHeader {
            protocol: protocols::DATA_ARRAY,
            message_type: 5,
            correlation_id: 42,
            message_id: 108,
            message_flags: MessageFlags::MULTIPART | MessageFlags::ACK,
        };
        let bytes = encode_header(&header).unwrap();
        let mut reader = bytes.as_slice();
        assert_eq!(decode_header(&mut reader).unwrap(), header);
        assert!(reader.is_empty());
    }

    #[test]
    fn request_session_round_trip() {
        round_trip(EtpBody::RequestSession(RequestSession {
            application_name: "etp-rs".to_owned(),
            application_version: "0.1.0".to_owned(),
            client_instance_id: Uuid::new_v4(),
            requested_protocols: vec![SupportedProtocol {
                protocol: protocols::DATASPACE,
                protocol_version: ProtocolVersion::V1_2,
                role: "store".to_owned(),
            }],
            supported_formats: vec!["xml".to_owned(), "json".to_owned()],
            current_date_time: 1_700_000_000_000_000,
            endpoint_capabilities: BTreeMap::from([
                ("MaxWebSocketFramePayloadSize".to_owned(), DataValue::Long(900_000)),
                ("SupportsAlterableMetadata".to_owned(), DataValue::Boolean(false)),
            ]),
        }));
    }

    #[test]
    fn open_session_round_trip() {
        round_trip(EtpBody::OpenSession(OpenSession {
            application_name: "stub-store".to_owned(),
            application_version: "1.0".to_owned(),
            server_instance_id: Uuid::new_v4(),
            supported_protocols: vec![],
            supported_formats: vec!["xml".to_owned()],
            session_id: Uuid::new_v4(),
            current_date_time: 1,
            endpoint_capabilities: BTreeMap::from([(
                "MaxDataArraySize".to_owned(),
                DataValue::Long(250_000),
            )]),
        }));
    }

    #[test]
    fn core_small_messages_round_trip() {
        round_trip(EtpBody::CloseSession(CloseSession { reason: "done".to_owned() }));
        round_trip(EtpBody::Ping(Ping { current_date_time: 7 }));
        round_trip(EtpBody::Pong(Pong { current_date_time: 8 }));
        round_trip(EtpBody::ProtocolException(ProtocolException {
            code: 11,
            message: "Not Found".to_owned(),
        }));
        round_trip(EtpBody::Acknowledge(Acknowledge));
        round_trip(EtpBody::Authorize(Authorize {
            authorization: "Bearer abc".to_owned(),
            supplemental_authorization: BTreeMap::new(),
        }));
        round_trip(EtpBody::AuthorizeResponse(AuthorizeResponse {
            success: true,
            challenges: vec![],
        }));
    }

    #[test]
    fn discovery_round_trip() {
        round_trip(EtpBody::GetResources(GetResources {
            uri: "eml:///dataspace('brgm')".to_owned(),
            depth: 2,
            scope: ContextScopeKind::TargetsOrSelf,
            count_objects: true,
            store_last_write_filter: None,
            active_status_filter: Some(ActiveStatusKind::Active),
            include_edges: true,
        }));
        round_trip(EtpBody::GetResourcesResponse(GetResourcesResponse {
            resources: vec![sample_resource("eml:///dataspace('a')/resqml22.Fault(x)")],
        }));
        round_trip(EtpBody::GetResourcesEdgesResponse(GetResourcesEdgesResponse {
            edges: vec![Edge { source_uri: "eml:///a".to_owned(), target_uri: "eml:///b".to_owned() }],
        }));
    }

    #[test]
    fn store_round_trip_including_blob_chunks() {
        let object = DataObject {
            resource: sample_resource("eml:///dataspace('a')/resqml22.Fault(x)"),
            format: "json".to_owned(),
            blob_id: Some(Uuid::new_v4()),
            data: vec![1, 2, 3, 4],
        };
        round_trip(EtpBody::PutDataObjects(PutDataObjects {
            data_objects: BTreeMap::from([("0".to_owned(), object)]),
            prune_contained_objects: false,
        }));
        round_trip(EtpBody::Chunk(Chunk {
            blob_id: Uuid::new_v4(),
            data: vec![9; 64],
            final_chunk: true,
        }));
        round_trip(EtpBody::DeleteDataObjectsResponse(DeleteDataObjectsResponse {
            success: BTreeMap::from([("0".to_owned(), true)]),
        }));
    }

    #[test]
    fn data_array_round_trip_every_element_kind() {
        let arrays = [
            AnyArray::Boolean(vec![true, false]),
            AnyArray::Int(vec![-1, 0, 1]),
            AnyArray::Long(vec![i64::MIN, i64::MAX]),
            AnyArray::Float(vec![1.5, -2.5]),
            AnyArray::Double(vec![std::f64::consts::PI]),
            AnyArray::String(vec!["a".to_owned(), "b".to_owned()]),
            AnyArray::Bytes(vec![0, 255]),
        ];
        for data in arrays {
            round_trip(EtpBody::PutDataArrays(PutDataArrays {
                data_arrays: BTreeMap::from([(
                    "0".to_owned(),
                    PutDataArraysType {
                        uid: DataArrayIdentifier {
                            uri: "eml:///dataspace('d')".to_owned(),
                            path_in_resource: "/test/points".to_owned(),
                        },
                        array: DataArray { dimensions: vec![2], data },
                    },
                )]),
            }));
        }
    }

    #[test]
    fn subarray_round_trip() {
        round_trip(EtpBody::PutDataSubarrays(PutDataSubarrays {
            data_subarrays: BTreeMap::from([(
                "0".to_owned(),
                PutDataSubarraysType {
                    uid: DataArrayIdentifier {
                        uri: "eml:///dataspace('d')".to_owned(),
                        path_in_resource: "/p".to_owned(),
                    },
                    data: AnyArray::Double(vec![0.0; 16]),
                    starts: vec![0, 0],
                    counts: vec![4, 4],
                },
            )]),
        }));
        round_trip(EtpBody::GetDataArrayMetadataResponse(GetDataArrayMetadataResponse {
            array_metadata: BTreeMap::from([(
                "0".to_owned(),
                DataArrayMetadata {
                    dimensions: vec![1000, 1000],
                    transport_array_type: AnyArrayType::ArrayOfDouble,
                    store_last_write: 10,
                    store_created: 9,
                },
            )]),
        }));
    }

    #[test]
    fn dataspace_round_trip() {
        round_trip(EtpBody::GetDataspaces(GetDataspaces { store_last_write_filter: Some(5) }));
        round_trip(EtpBody::GetDataspacesResponse(GetDataspacesResponse {
            dataspaces: vec![Dataspace {
                uri: "eml:///dataspace('A')".to_owned(),
                path: Some("A".to_owned()),
                store_last_write: 2,
                store_created: 1,
                custom_data: BTreeMap::from([
                    ("legal_tags".to_owned(), DataValue::StringArray(vec!["public".to_owned()])),
                    ("owner".to_owned(), DataValue::String("geosiris".to_owned())),
                ]),
            }],
        }));
        round_trip(EtpBody::DeleteDataspaces(DeleteDataspaces {
            uris: BTreeMap::from([("0".to_owned(), "eml:///dataspace('A')".to_owned())]),
        }));
    }

    #[test]
    fn transaction_round_trip() {
        round_trip(EtpBody::StartTransaction(StartTransaction {
            dataspace_uris: vec!["eml:///dataspace('A')".to_owned()],
            read_only: false,
            message: String::new(),
        }));
        round_trip(EtpBody::StartTransactionResponse(StartTransactionResponse {
            transaction_uuid: Uuid::new_v4(),
            successful: true,
            failure_reason: String::new(),
        }));
    }

    #[test]
    fn supported_types_round_trip() {
        round_trip(EtpBody::GetSupportedTypes(GetSupportedTypes {
            uri: "eml:///".to_owned(),
            scope: ContextScopeKind::Self_,
            return_empty_types: false,
            count_objects: true,
        }));
        round_trip(EtpBody::GetSupportedTypesResponse(GetSupportedTypesResponse {
            supported_types: vec![SupportedType {
                data_object_type: "resqml22.FaultInterpretation".to_owned(),
                object_count: Some(3),
            }],
        }));
    }

    #[test]
    fn unknown_discriminant_is_reported_not_fatal() {
        let err = decode_body(99, 1, &[]).unwrap_err();
        match err {
            CodecError::UnknownMessageType { protocol, message_type } => {
                assert_eq!(protocol, 99);
                assert_eq!(message_type, 1);
            }
            other => panic!("expected UnknownMessageType, got {other:?}"),
        }
    }

    #[test]
    fn truncated_body_is_a_format_error() {
        let body = EtpBody::Ping(Ping { current_date_time: 123_456_789 });
        let bytes = encode_body(&body).unwrap();
        let err = decode_body(protocols::CORE, 8, &bytes[..bytes.len() - 1]);
        assert!(err.is_err(), "truncated datum must not decode");
    }
}
