//! Large array writes split into row-major subarray windows.

use std::time::Duration;

use etp_client::{EtpClient, EtpConfig, Outcome};
use etp_proto::AnyArray;
use etp_test_utils::{MockBehavior, MockEtpServer};

#[tokio::test]
async fn oversized_put_emits_four_disjoint_row_major_windows() {
    // 1000x1000 doubles against a negotiated 250 000-element budget.
    let server = MockEtpServer::start(MockBehavior {
        max_data_array_size: Some(250_000),
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();
    assert_eq!(client.capabilities().max_data_array_size, 250_000);

    let data = AnyArray::Double((0..1_000_000).map(f64::from).collect());
    let outcome = client
        .put_data_array(
            "eml:///dataspace('demo')",
            "/test/points",
            data,
            vec![1000, 1000],
            Some(Duration::from_secs(30)),
        )
        .await
        .unwrap();

    let Outcome::Value(success) = outcome else { panic!("expected a value") };
    assert_eq!(success.len(), 4, "exactly four PutDataSubarrays");
    assert!(success.values().all(|ok| *ok));

    let recorded = server.recorded_put_subarrays();
    assert_eq!(recorded.len(), 4);
    for (index, put) in recorded.iter().enumerate() {
        assert_eq!(put.uid.uri, "eml:///dataspace('demo')");
        assert_eq!(put.uid.path_in_resource, "/test/points");
        assert_eq!(put.starts, vec![index as i64 * 250, 0], "windows are contiguous row blocks");
        assert_eq!(put.counts, vec![250, 1000]);
        assert_eq!(put.data.len(), 250_000);
    }

    // The union is the full shape, byte for byte: the first element of
    // each window is the first element of its row block.
    for (index, put) in recorded.iter().enumerate() {
        let AnyArray::Double(values) = &put.data else { panic!("expected doubles") };
        assert_eq!(values[0], (index as f64) * 250_000.0);
    }

    client.close().await;
}

#[tokio::test]
async fn small_arrays_travel_whole() {
    let server = MockEtpServer::start(MockBehavior {
        max_data_array_size: Some(250_000),
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let data = AnyArray::Long((0..6).collect());
    let outcome = client
        .put_data_array("eml:///dataspace('demo')", "/test/small", data, vec![2, 3], None)
        .await
        .unwrap();
    assert!(!outcome.is_rejected());
    assert!(server.recorded_put_subarrays().is_empty(), "no tiling below the limit");

    client.close().await;
}
