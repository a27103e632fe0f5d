//! rustls connector for the PostgreSQL driver.

use std::sync::Arc;

use rustls::ClientConfig;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, warn};

use super::SslMode;

/// Builds the TLS connector for a given [`SslMode`].
pub struct TlsBuilder {
    ssl_mode: SslMode,
}

impl TlsBuilder {
    pub fn new(ssl_mode: SslMode) -> Self {
        Self { ssl_mode }
    }

    /// The connector, or `None` when TLS is disabled.
    pub fn build(&self) -> Option<MakeRustlsConnect> {
        if !self.ssl_mode.uses_tls() {
            return None;
        }
        Some(MakeRustlsConnect::new(self.client_config()))
    }

    fn client_config(&self) -> ClientConfig {
        if self.ssl_mode.verifies_certificate() {
            debug!("ssl_mode={:?}: verifying server certificate", self.ssl_mode);
            let mut roots = rustls::RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            return ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
        }

        warn!(
            "ssl_mode={:?} encrypts the connection but does NOT verify the server \
             certificate; use verify-full outside development",
            self.ssl_mode
        );
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth()
    }
}

/// Certificate verifier for the non-verifying modes (`prefer`, `require`).
#[derive(Debug)]
struct AcceptAnyCertificate;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_builds_no_connector() {
        assert!(TlsBuilder::new(SslMode::Disable).build().is_none());
    }

    #[test]
    fn test_tls_modes_build_connector() {
        for mode in [SslMode::Prefer, SslMode::Require, SslMode::VerifyFull] {
            assert!(TlsBuilder::new(mode).build().is_some());
        }
    }
}
