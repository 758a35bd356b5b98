//! TLS Connector implementation
//!
//! TCP dial followed by a rustls client handshake. The endpoint host is
//! always the SNI value, and the returned stream is only handed up after
//! the handshake has fully completed.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use tracing::debug;

use crate::common::{Endpoint, Result, Stream};
use crate::config::TlsSettings;
use crate::error::Error;

use super::{Connector, TcpConnector};

/// Where the rustls client config comes from
enum ClientConfigSource {
    /// Built from settings on every connect, so that bad settings
    /// (unreadable CA file, ...) surface as connect errors
    Settings(TlsSettings),
    /// Caller-supplied config
    Prebuilt(Arc<ClientConfig>),
}

/// TLS-over-TCP connector
pub struct TlsConnector {
    tcp: TcpConnector,
    source: ClientConfigSource,
}

impl TlsConnector {
    pub fn new(settings: TlsSettings) -> Self {
        Self {
            tcp: TcpConnector::new(),
            source: ClientConfigSource::Settings(settings),
        }
    }

    /// Use an already built rustls client config (custom roots, client auth)
    pub fn from_client_config(config: Arc<ClientConfig>) -> Self {
        Self {
            tcp: TcpConnector::new(),
            source: ClientConfigSource::Prebuilt(config),
        }
    }

    fn client_config(&self) -> Result<Arc<ClientConfig>> {
        match &self.source {
            ClientConfigSource::Settings(settings) => build_client_config(settings).map(Arc::new),
            ClientConfigSource::Prebuilt(config) => Ok(Arc::clone(config)),
        }
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new(TlsSettings::default())
    }
}

#[async_trait]
impl Connector for TlsConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Stream> {
        let server_name = ServerName::try_from(endpoint.host().to_string())
            .map_err(|_| Error::InvalidAddress(format!("Invalid server name: {}", endpoint.host())))?;
        let connector = tokio_rustls::TlsConnector::from(self.client_config()?);

        let tcp_stream = self.tcp.dial(endpoint).await?;

        debug!("TLS: starting handshake with {}", endpoint);
        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(handshake_error)?;

        let (_, session) = tls_stream.get_ref();
        debug!(
            "TLS: handshake with {} complete ({:?}, alpn={:?})",
            endpoint,
            session.protocol_version(),
            session.alpn_protocol().map(String::from_utf8_lossy),
        );

        Ok(Box::new(tls_stream))
    }

    fn name(&self) -> &'static str {
        "tls"
    }
}

/// tokio-rustls reports protocol and certificate failures as `InvalidData`
fn handshake_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::InvalidData {
        Error::Tls(err.to_string())
    } else {
        Error::Io(err)
    }
}

fn build_client_config(settings: &TlsSettings) -> Result<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = &settings.ca_file {
        for cert in load_certs(path)? {
            root_store
                .add(cert)
                .map_err(|e| Error::Tls(format!("Rejected CA certificate from {}: {}", path, e)))?;
        }
    }

    let mut tls_config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    if !settings.alpn.is_empty() {
        tls_config.alpn_protocols = settings
            .alpn
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();
    }

    if settings.allow_insecure {
        tls_config
            .dangerous()
            .set_certificate_verifier(Arc::new(NoCertificateVerification));
    }

    Ok(tls_config)
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| Error::Config(format!("Failed to open CA file {}: {}", path, e)))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("Failed to parse certificates in {}: {}", path, e)))?;

    if certs.is_empty() {
        return Err(Error::Config(format!("No certificates found in {}", path)));
    }
    Ok(certs)
}

/// Accepts any server certificate. Test gateways only.
#[derive(Debug)]
struct NoCertificateVerification;

impl rustls::client::danger::ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            ECDSA_NISTP384_SHA384,
            ECDSA_NISTP521_SHA512,
            RSA_PSS_SHA256,
            RSA_PSS_SHA384,
            RSA_PSS_SHA512,
            ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_build() {
        let config = build_client_config(&TlsSettings::default()).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn test_alpn_is_offered() {
        let settings = TlsSettings {
            alpn: vec!["gw/1".into(), "gw/0".into()],
            ..Default::default()
        };
        let config = build_client_config(&settings).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"gw/1".to_vec(), b"gw/0".to_vec()]);
    }

    #[test]
    fn test_missing_ca_file_is_config_error() {
        let settings = TlsSettings {
            ca_file: Some("/nonexistent/gatelink-ca.pem".into()),
            ..Default::default()
        };
        assert!(matches!(build_client_config(&settings), Err(Error::Config(_))));
    }

    #[test]
    fn test_ca_file_without_certificates_is_rejected() {
        let path = std::env::temp_dir().join(format!("gatelink-empty-{}.pem", std::process::id()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "not a certificate").unwrap();

        let result = load_certs(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_handshake_error_mapping() {
        let tls = handshake_error(io::Error::new(io::ErrorKind::InvalidData, "bad cert"));
        assert!(matches!(tls, Error::Tls(_)));

        let io_err = handshake_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(matches!(io_err, Error::Io(_)));
    }

    #[test]
    fn test_prebuilt_config_is_reused() {
        let config = Arc::new(build_client_config(&TlsSettings::default()).unwrap());
        let connector = TlsConnector::from_client_config(Arc::clone(&config));
        assert!(Arc::ptr_eq(&connector.client_config().unwrap(), &config));
    }

    #[tokio::test]
    async fn test_invalid_server_name_fails_before_dialing() {
        let connector = TlsConnector::default();
        let result = connector.connect(&Endpoint::new("not a hostname!", 443)).await;
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }
}
