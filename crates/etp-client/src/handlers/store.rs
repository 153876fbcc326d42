//! Store protocol (4) requests, including chunked object transfer.

use std::collections::BTreeMap;

use etp_proto::messages::store::{DataObject, DeleteDataObjects, GetDataObjects, PutDataObjects};
use etp_proto::{EtpBody, MessageFlags};

use super::{collect, single};
use crate::chunking;
use crate::error::{ClientError, Outcome};

pub(crate) fn get_data_objects_request(uris: BTreeMap<String, String>, format: &str) -> EtpBody {
    EtpBody::GetDataObjects(GetDataObjects { uris, format: format.to_owned() })
}

pub(crate) fn delete_data_objects_request(uris: BTreeMap<String, String>) -> EtpBody {
    EtpBody::DeleteDataObjects(DeleteDataObjects { uris, prune_contained_objects: false })
}

/// Build the bodies of one put operation.
///
/// Objects above `max_object_size` are replaced by blob metadata, and
/// their bodies follow as `Chunk` messages.  All bodies share the message
/// id of the operation: the put itself stays unflagged when chunks follow,
/// chunks carry MULTIPART, and the last body carries FINAL.
pub(crate) fn put_data_objects_bodies(
    objects: BTreeMap<String, DataObject>,
    max_object_size: usize,
) -> Vec<(EtpBody, MessageFlags)> {
    let mut chunks = Vec::new();
    let data_objects = objects
        .into_iter()
        .map(|(key, object)| {
            let (object, object_chunks) = chunking::split_object(object, max_object_size);
            chunks.extend(object_chunks);
            (key, object)
        })
        .collect();

    let put = EtpBody::PutDataObjects(PutDataObjects {
        data_objects,
        prune_contained_objects: false,
    });
    if chunks.is_empty() {
        return vec![(put, MessageFlags::FINAL)];
    }

    let mut bodies = vec![(put, MessageFlags::NONE)];
    let last = chunks.len() - 1;
    for (index, chunk) in chunks.into_iter().enumerate() {
        let flags = if index == last {
            MessageFlags::MULTIPART | MessageFlags::FINAL
        } else {
            MessageFlags::MULTIPART
        };
        bodies.push((EtpBody::Chunk(chunk), flags));
    }
    bodies
}

/// Fold response parts into objects, stitching chunked bodies back on.
pub(crate) fn collect_data_objects(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, DataObject>>, ClientError> {
    let outcome = collect(
        parts,
        (BTreeMap::new(), Vec::new()),
        |(objects, chunks): &mut (BTreeMap<String, DataObject>, Vec<_>), part| match part {
            EtpBody::GetDataObjectsResponse(response) => {
                objects.extend(response.data_objects);
                None
            }
            EtpBody::Chunk(chunk) => {
                chunks.push(chunk);
                None
            }
            other => Some(other),
        },
    )?;
    Ok(outcome.map(|(mut objects, chunks)| {
        chunking::stitch_chunks(&mut objects, chunks);
        objects
    }))
}

pub(crate) fn collect_put_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "PutDataObjectsResponse", |part| match part {
        EtpBody::PutDataObjectsResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

pub(crate) fn collect_delete_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "DeleteDataObjectsResponse", |part| match part {
        EtpBody::DeleteDataObjectsResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

#[cfg(test)]
mod tests {
    use etp_proto::messages::ActiveStatusKind;
    use etp_proto::messages::discovery::Resource;
    use etp_proto::messages::store::GetDataObjectsResponse;

    use super::*;

    fn object(body_len: usize) -> DataObject {
        DataObject {
            resource: Resource {
                uri: "eml:///dataspace('d')/resqml22.Fault(u)".to_owned(),
                name: "f".to_owned(),
                source_count: None,
                target_count: None,
                last_changed: 0,
                store_last_write: 0,
                active_status: ActiveStatusKind::Active,
            },
            format: "xml".to_owned(),
            blob_id: None,
            data: vec![0x42; body_len],
        }
    }

    #[test]
    fn small_puts_are_one_final_body() {
        let bodies =
            put_data_objects_bodies(BTreeMap::from([("0".to_owned(), object(10))]), 1_000);
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].1, MessageFlags::FINAL);
    }

    #[test]
    fn large_puts_trail_chunks_with_final_on_the_last() {
        let bodies =
            put_data_objects_bodies(BTreeMap::from([("0".to_owned(), object(2_500))]), 1_000);
        assert_eq!(bodies.len(), 4, "put + 3 chunks");
        assert_eq!(bodies[0].1, MessageFlags::NONE);
        assert_eq!(bodies[1].1, MessageFlags::MULTIPART);
        assert_eq!(bodies[3].1, MessageFlags::MULTIPART | MessageFlags::FINAL);

        let EtpBody::PutDataObjects(put) = &bodies[0].0 else { panic!("expected put") };
        assert!(put.data_objects["0"].data.is_empty());
        assert!(put.data_objects["0"].blob_id.is_some());
    }

    #[test]
    fn chunked_response_is_stitched_back() {
        let full = object(2_500);
        let expected = full.data.clone();
        let (meta, chunks) = chunking::split_object(full, 1_000);

        let mut parts = vec![EtpBody::GetDataObjectsResponse(GetDataObjectsResponse {
            data_objects: BTreeMap::from([("0".to_owned(), meta)]),
        })];
        parts.extend(chunks.into_iter().map(EtpBody::Chunk));

        let Outcome::Value(objects) = collect_data_objects(parts).unwrap() else {
            panic!("expected value");
        };
        assert_eq!(objects["0"].data, expected);
    }
}
