//! WebSocket transport: URL rewriting, the authenticated upgrade request,
//! and the optional certificate-check bypass for development servers.

use std::sync::Arc;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async, connect_async_tls_with_config};

use crate::config::EtpConfig;
use crate::error::ClientError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Rewrite an endpoint URL to a WebSocket scheme.
///
/// `http://` becomes `ws://`, `https://` becomes `wss://`, and a bare host
/// defaults to `wss://`.
pub fn normalize_ws_url(url: &str) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        url.to_owned()
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("wss://{url}")
    }
}

/// Open the WebSocket with auth and passthrough headers applied to the
/// upgrade request.
pub(crate) async fn connect_websocket(config: &EtpConfig) -> Result<WsStream, ClientError> {
    let url = normalize_ws_url(&config.url);
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| ClientError::Transport(format!("invalid URL '{url}': {e}")))?;

    if let Some(authorization) = config.credentials.authorization_header()? {
        request.headers_mut().insert(
            "Authorization",
            authorization
                .parse()
                .map_err(|e| ClientError::Transport(format!("invalid auth header: {e}")))?,
        );
    }
    for (name, value) in &config.additional_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Transport(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Transport(format!("invalid header value: {e}")))?;
        request.headers_mut().insert(name, value);
    }

    let (ws, _response) = if config.verify_tls {
        connect_async(request).await.map_err(|e| ClientError::Transport(e.to_string()))?
    } else {
        let connector = Connector::Rustls(Arc::new(insecure_tls_config()));
        connect_async_tls_with_config(request, None, false, Some(connector))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?
    };
    Ok(ws)
}

/// TLS config that accepts any certificate.
///
/// WARNING: development only; enabled by `verify = false`.
fn insecure_tls_config() -> rustls::ClientConfig {
    rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier))
        .with_no_client_auth()
}

/// Certificate verifier that accepts any certificate.
#[derive(Debug)]
struct InsecureCertVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_schemes_are_rewritten() {
        assert_eq!(normalize_ws_url("http://host/path"), "ws://host/path");
        assert_eq!(normalize_ws_url("https://host/path"), "wss://host/path");
    }

    #[test]
    fn ws_schemes_pass_through() {
        assert_eq!(normalize_ws_url("ws://host"), "ws://host");
        assert_eq!(normalize_ws_url("wss://host"), "wss://host");
    }

    #[test]
    fn bare_hosts_default_to_wss() {
        assert_eq!(normalize_ws_url("etp.example.com:443"), "wss://etp.example.com:443");
    }
}
