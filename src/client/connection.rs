//! Connection establishment for the relay client
//!
//! Validates the endpoint, builds the rustls client configuration and performs
//! the WebSocket handshake under a timeout. There is no retry: a failed
//! attempt is returned to the caller as-is.

use crate::config::ClientConfig;
use crate::error::{Result, WikiError};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig as TlsConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{Connector, connect_async_tls_with_config};
use tracing::{debug, info, warn};
use url::Url;

use super::RelayConnection;
use super::io::{WsStream, spawn_reader, spawn_writer};
use super::subscription::Routes;

/// Dangerous certificate verifier that accepts all certificates
///
/// **Security Warning:** This verifier disables all certificate validation,
/// making connections vulnerable to man-in-the-middle attacks. Only use this
/// for testing or with relays you trust on a secure network.
#[derive(Debug)]
pub(super) struct DangerousAcceptAnyCertificate;

impl ServerCertVerifier for DangerousAcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

/// Check that `endpoint` is a ws:// or wss:// URL
pub fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| WikiError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(WikiError::InvalidUrl(format!(
            "URL must use ws:// or wss:// scheme, got: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Build the rustls configuration used for wss:// endpoints
fn tls_config(allow_insecure_tls: bool) -> TlsConfig {
    use rustls::crypto::{CryptoProvider, ring};
    let _ = CryptoProvider::install_default(ring::default_provider());

    if allow_insecure_tls {
        warn!("TLS certificate validation disabled - connection vulnerable to MITM attacks");
        TlsConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertificate))
            .with_no_client_auth()
    } else {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        TlsConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    }
}

impl RelayConnection {
    /// Connect to a relay
    ///
    /// `endpoint` is kept verbatim as the connection's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`WikiError::InvalidUrl`] - the endpoint is not a ws:// or wss:// URL
    /// - [`WikiError::Tls`] - the TLS handshake fails
    /// - [`WikiError::WebSocket`] - TCP connect or WebSocket upgrade fails
    /// - [`WikiError::Timeout`] - the handshake exceeds the configured timeout
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        validate_endpoint(endpoint)?;
        info!("Connecting to relay {}", endpoint);

        let connector = Connector::Rustls(Arc::new(tls_config(config.allow_insecure_tls)));
        let (stream, response) = timeout(
            config.connect_timeout(),
            connect_async_tls_with_config(endpoint, None, true, Some(connector)),
        )
        .await
        .map_err(|_| WikiError::Timeout)?
        .map_err(|e| match e {
            WsError::Tls(tls) => WikiError::Tls(format!("TLS handshake failed: {}", tls)),
            other => WikiError::WebSocket(other.to_string()),
        })?;

        debug!(
            "Relay {} accepted handshake with status {}",
            endpoint,
            response.status()
        );
        Ok(Self::from_stream(endpoint, stream))
    }

    /// Wrap an established WebSocket stream and start its I/O tasks
    fn from_stream(endpoint: &str, stream: WsStream) -> Self {
        use futures_util::StreamExt;

        let (sink, source) = stream.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let routes = Arc::new(Routes::default());
        let open = Arc::new(AtomicBool::new(true));

        let writer = spawn_writer(sink, outbound_rx, Arc::clone(&open), endpoint.to_string());
        let reader = spawn_reader(
            source,
            Arc::clone(&routes),
            Arc::clone(&open),
            endpoint.to_string(),
        );

        info!("Connected to relay {}", endpoint);
        Self {
            endpoint: endpoint.to_string(),
            outbound,
            routes,
            open,
            close_queued: AtomicBool::new(false),
            reader,
            writer,
        }
    }
}
