//! Timeout behavior: a silent server bounds every wait, and expired
//! requests leave no pending state behind.

use std::time::{Duration, Instant};

use etp_client::{ClientError, EtpClient, EtpConfig};
use etp_test_utils::{MockBehavior, MockEtpServer};

#[tokio::test]
async fn unanswered_ping_times_out_on_schedule_and_cleans_up() {
    let server = MockEtpServer::start(MockBehavior {
        silent_on_ping: true,
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let started = Instant::now();
    let err = client.ping(Some(Duration::from_secs(1))).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ClientError::Timeout), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(900), "returned early: {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1500), "returned late: {elapsed:?}");

    // The slot is consumed; a late reply would be dropped.
    assert_eq!(client.pending_requests(), 0);

    // The session itself is still healthy.
    assert!(client.is_connected());
    client.close().await;
}

#[tokio::test]
async fn closing_the_client_wakes_pending_waiters() {
    let server = MockEtpServer::start(MockBehavior {
        silent_on_ping: true,
        ..MockBehavior::default()
    })
    .await
    .unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let waiter = client.clone();
    let pending = tokio::spawn(async move { waiter.ping(Some(Duration::from_secs(30))).await });

    // Let the ping get registered before closing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.pending_requests(), 1);
    client.close().await;

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::ConnectionClosed), "got {err:?}");
    assert_eq!(client.pending_requests(), 0);
}
