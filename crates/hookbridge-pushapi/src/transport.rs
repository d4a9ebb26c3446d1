//! TLS transport to the capture server.

use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

use hookbridge_core::config::capture::CaptureConfig;

use crate::client::PushApiClient;
use crate::error::PushApiError;

pub use rustls::ClientConfig as TlsClientConfig;

/// Client over a TLS-wrapped TCP connection.
pub type TlsClient = PushApiClient<TlsStream<TcpStream>>;

/// Build the rustls client configuration.
///
/// With a CA bundle the server certificate is validated against it.
/// Without one any certificate is accepted, which is how capture servers
/// with self-signed certificates are usually deployed.
pub fn tls_config(ca_file: Option<&str>) -> Result<Arc<ClientConfig>, PushApiError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| PushApiError::Tls(e.to_string()))?;

    let config = match ca_file {
        Some(path) => {
            let mut roots = RootCertStore::empty();
            let certs = CertificateDer::pem_file_iter(path)
                .map_err(|e| PushApiError::Tls(format!("cannot read CA file {path}: {e}")))?;
            for cert in certs {
                let cert = cert
                    .map_err(|e| PushApiError::Tls(format!("bad certificate in {path}: {e}")))?;
                roots
                    .add(cert)
                    .map_err(|e| PushApiError::Tls(format!("rejected CA certificate: {e}")))?;
            }
            if roots.is_empty() {
                return Err(PushApiError::Tls(format!("no certificates in {path}")));
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        None => {
            warn!("No CA file configured, capture server certificate will not be validated");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
                .with_no_client_auth()
        }
    };
    Ok(Arc::new(config))
}

/// Open a TLS connection to the configured capture server.
pub async fn connect(
    config: &CaptureConfig,
    tls: Arc<ClientConfig>,
) -> Result<TlsClient, PushApiError> {
    let address = config.address();
    let name = config
        .tls
        .server_name
        .clone()
        .unwrap_or_else(|| config.host.clone());
    let server_name =
        ServerName::try_from(name).map_err(|e| PushApiError::Tls(format!("server name: {e}")))?;

    debug!(%address, "Connecting to capture server");
    let timeout = Duration::from_secs(config.connect_timeout_seconds);
    let stream = tokio::time::timeout(timeout, handshake(&address, server_name, tls))
        .await
        .map_err(|_| PushApiError::Timeout(format!("connect to {address}")))??;
    debug!(%address, "TLS session established");

    Ok(PushApiClient::new(
        stream,
        config.max_frame_bytes,
        Duration::from_secs(config.io_timeout_seconds),
    ))
}

async fn handshake(
    address: &str,
    server_name: ServerName<'static>,
    tls: Arc<ClientConfig>,
) -> Result<TlsStream<TcpStream>, PushApiError> {
    let tcp = TcpStream::connect(address).await?;
    tcp.set_nodelay(true)?;
    TlsConnector::from(tls)
        .connect(server_name, tcp)
        .await
        .map_err(|e| PushApiError::Tls(format!("handshake with {address}: {e}")))
}

/// Verifier that skips certificate validation but still checks handshake
/// signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_without_ca_accepts_any_certificate() {
        assert!(tls_config(None).is_ok());
    }

    #[test]
    fn test_missing_ca_file_is_tls_error() {
        let err = tls_config(Some("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, PushApiError::Tls(_)));
    }

    #[test]
    fn test_ca_file_without_certificates_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();
        let err = tls_config(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("no certificates"));
    }

    #[tokio::test]
    async fn test_connect_refused_is_io_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = CaptureConfig {
            host: "127.0.0.1".into(),
            port,
            company_name: "acme".into(),
            token: "t".into(),
            client_version: None,
            connect_timeout_seconds: 2,
            io_timeout_seconds: 2,
            max_frame_bytes: 1024,
            server_ip: "127.0.0.1".into(),
            server_fqdn: "localhost".into(),
            tls: Default::default(),
        };
        let err = connect(&config, tls_config(None).unwrap()).await.unwrap_err();
        assert!(matches!(err, PushApiError::Io(_)));
    }
}
