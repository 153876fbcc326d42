//! Dataspace listing and mutation round trips.

use std::collections::BTreeMap;

use etp_client::{EtpClient, EtpConfig, Outcome};
use etp_proto::messages::dataspace::Dataspace;
use etp_test_utils::{MockBehavior, MockEtpServer};

fn dataspace(uri: &str) -> Dataspace {
    Dataspace {
        uri: uri.to_owned(),
        path: None,
        store_last_write: 10,
        store_created: 5,
        custom_data: BTreeMap::new(),
    }
}

#[tokio::test]
async fn streamed_dataspace_responses_arrive_in_server_order() {
    // The mock streams one response body per dataspace, FINAL on the last.
    let server = MockEtpServer::start(MockBehavior {
        dataspaces: vec![dataspace("eml:///dataspace('A')"), dataspace("eml:///dataspace('B')")],
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let Outcome::Value(dataspaces) = client.get_dataspaces(None).await.unwrap() else {
        panic!("expected a value");
    };
    let uris: Vec<&str> = dataspaces.iter().map(|d| d.uri.as_str()).collect();
    assert_eq!(uris, vec!["eml:///dataspace('A')", "eml:///dataspace('B')"]);

    client.close().await;
}

#[tokio::test]
async fn put_and_delete_return_per_item_success_maps() {
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let Outcome::Value(put) = client.put_dataspaces(["alpha", "beta"], None).await.unwrap()
    else {
        panic!("expected a value");
    };
    assert_eq!(put, BTreeMap::from([("0".to_owned(), true), ("1".to_owned(), true)]));

    let Outcome::Value(deleted) = client.delete_dataspaces(["alpha"], None).await.unwrap()
    else {
        panic!("expected a value");
    };
    assert_eq!(deleted, BTreeMap::from([("0".to_owned(), true)]));

    client.close().await;
}
