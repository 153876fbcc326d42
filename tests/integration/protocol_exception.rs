//! Protocol exception routing: a correlated exception resolves exactly
//! the waiter it belongs to, as a value, leaving other waiters alone.

use std::collections::HashMap;
use std::time::Duration;

use etp_client::{EtpClient, EtpConfig, Outcome};
use etp_test_utils::{MockBehavior, MockEtpServer};

#[tokio::test]
async fn exception_goes_to_its_waiter_only() {
    let missing = "eml:///dataspace('missing')";
    let present = "eml:///dataspace('present')";
    let server = MockEtpServer::start(MockBehavior {
        fail_resources: HashMap::from([(missing.to_owned(), (11, "Not Found".to_owned()))]),
        resources: HashMap::from([(present.to_owned(), vec![])]),
        // Delay the healthy request so both conversations overlap.
        resource_delay_ms: HashMap::from([(present.to_owned(), 100u64)]),
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let failing = client.clone();
    let healthy = client.clone();
    let failing_task = tokio::spawn(async move {
        failing.get_resources(Some("missing"), Some(Duration::from_secs(2))).await
    });
    let healthy_task = tokio::spawn(async move {
        healthy.get_resources(Some("present"), Some(Duration::from_secs(2))).await
    });

    match failing_task.await.unwrap().unwrap() {
        Outcome::Rejected(exception) => {
            assert_eq!(exception.code, 11);
            assert_eq!(exception.message, "Not Found");
        }
        Outcome::Value(resources) => panic!("expected rejection, got {resources:?}"),
    }

    // The other pending waiter is unaffected.
    let Outcome::Value(resources) = healthy_task.await.unwrap().unwrap() else {
        panic!("healthy request must succeed");
    };
    assert!(resources.is_empty());

    // The session survives a correlated exception.
    assert!(client.is_connected());
    assert_eq!(client.pending_requests(), 0);
    client.close().await;
}
