//! Session handshake against the mock store.

use std::time::Duration;

use etp_client::{ClientError, EtpClient, EtpConfig};
use etp_test_utils::{MockBehavior, MockEtpServer};

/// Opt-in log output for debugging: `RUST_LOG=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

#[tokio::test]
async fn handshake_activates_the_session_and_negotiates_capabilities() {
    init_tracing();
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();

    let started = std::time::Instant::now();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    assert!(client.is_connected());
    assert!(started.elapsed() < Duration::from_millis(500), "handshake should be fast locally");

    let caps = client.capabilities();
    assert_eq!(caps.max_ws_frame_payload_size, 900_000);
    assert_eq!(caps.max_ws_message_payload_size, 900_000);
    assert!(caps.session_id.is_some(), "OpenSession carries the session uuid");

    client.close().await;
    assert!(!client.is_connected());
}

#[tokio::test]
async fn silent_server_times_the_handshake_out() {
    let server = MockEtpServer::start(MockBehavior {
        silent_on_handshake: true,
        ..MockBehavior::default()
    })
    .await
    .unwrap();

    let mut config = EtpConfig::new(server.url());
    config.handshake_timeout = Duration::from_millis(300);

    let started = std::time::Instant::now();
    let err = EtpClient::connect(config).await.unwrap_err();
    assert!(matches!(err, ClientError::HandshakeTimeout), "got {err:?}");
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn operations_fail_with_not_connected_after_close() {
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();
    client.close().await;

    let err = client.ping(None).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected), "got {err:?}");
}
