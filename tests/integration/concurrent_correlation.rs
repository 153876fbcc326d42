//! Correlation under concurrency: overlapping conversations on one
//! connection each resolve to their own reply, whatever order the server
//! answers in.

use std::collections::HashMap;
use std::time::Duration;

use etp_client::{EtpClient, EtpConfig, Outcome};
use etp_proto::messages::ActiveStatusKind;
use etp_proto::messages::discovery::Resource;
use etp_test_utils::{MockBehavior, MockEtpServer};

fn resource(uri: &str) -> Resource {
    Resource {
        uri: uri.to_owned(),
        name: uri.rsplit('/').next().unwrap_or(uri).to_owned(),
        source_count: None,
        target_count: None,
        last_changed: 0,
        store_last_write: 0,
        active_status: ActiveStatusKind::Active,
    }
}

#[tokio::test]
async fn each_caller_receives_exactly_its_own_resources() {
    let x = "eml:///dataspace('X')";
    let y = "eml:///dataspace('Y')";
    let server = MockEtpServer::start(MockBehavior {
        resources: HashMap::from([
            (x.to_owned(), vec![resource("eml:///dataspace('X')/resqml22.Fault(x1)")]),
            (y.to_owned(), vec![resource("eml:///dataspace('Y')/resqml22.Fault(y1)")]),
        ]),
        // X answers late, so Y's reply overtakes it on the wire.
        resource_delay_ms: HashMap::from([(x.to_owned(), 150u64)]),
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let client_x = client.clone();
    let client_y = client.clone();
    let task_x = tokio::spawn(async move {
        client_x.get_resources(Some("X"), Some(Duration::from_secs(2))).await
    });
    let task_y = tokio::spawn(async move {
        client_y.get_resources(Some("Y"), Some(Duration::from_secs(2))).await
    });

    let Outcome::Value(resources_x) = task_x.await.unwrap().unwrap() else {
        panic!("expected a value for X");
    };
    let Outcome::Value(resources_y) = task_y.await.unwrap().unwrap() else {
        panic!("expected a value for Y");
    };

    assert_eq!(resources_x.len(), 1);
    assert!(resources_x[0].uri.contains("dataspace('X')"), "X got {:?}", resources_x[0].uri);
    assert_eq!(resources_y.len(), 1);
    assert!(resources_y[0].uri.contains("dataspace('Y')"), "Y got {:?}", resources_y[0].uri);

    assert_eq!(client.pending_requests(), 0);
    client.close().await;
}

#[tokio::test]
async fn many_concurrent_pings_all_resolve() {
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.ping(None).await }));
    }
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert!(!outcome.is_rejected());
    }
    assert_eq!(client.pending_requests(), 0);
    client.close().await;
}
