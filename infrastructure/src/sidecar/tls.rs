//! TLS 1.3-only server configuration.
//!
//! Only the three TLS 1.3 AEAD suites of the aws-lc-rs provider are offered;
//! older protocol versions are never negotiated.

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::{CryptoProvider, aws_lc_rs};
use rustls::{CipherSuite, ServerConfig};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::debug;

use super::config::TlsFiles;
use super::error::SidecarError;

const ALLOWED_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS13_AES_256_GCM_SHA384,
    CipherSuite::TLS13_AES_128_GCM_SHA256,
    CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
];

/// Provider restricted to [`ALLOWED_SUITES`].
pub fn restricted_provider() -> CryptoProvider {
    let mut provider = aws_lc_rs::default_provider();
    provider
        .cipher_suites
        .retain(|suite| ALLOWED_SUITES.contains(&suite.suite()));
    provider
}

/// Read the PEM files and build the listener's TLS configuration.
pub fn load_server_config(files: &TlsFiles) -> Result<ServerConfig, SidecarError> {
    let certs = CertificateDer::pem_file_iter(&files.cert)
        .map_err(|e| SidecarError::TlsConfig(format!("certificate {}: {}", files.cert.display(), e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SidecarError::TlsConfig(format!("certificate {}: {}", files.cert.display(), e)))?;
    if certs.is_empty() {
        return Err(SidecarError::TlsConfig(format!(
            "certificate {}: no certificates found",
            files.cert.display()
        )));
    }

    let key = PrivateKeyDer::from_pem_file(&files.key)
        .map_err(|e| SidecarError::TlsConfig(format!("private key {}: {}", files.key.display(), e)))?;

    let mut config = ServerConfig::builder_with_provider(Arc::new(restricted_provider()))
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| SidecarError::TlsConfig(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| SidecarError::TlsConfig(e.to_string()))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    debug!(cert = %files.cert.display(), "Loaded TLS certificate");
    Ok(config)
}

pub fn rustls_config(files: &TlsFiles) -> Result<RustlsConfig, SidecarError> {
    Ok(RustlsConfig::from_config(Arc::new(load_server_config(files)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_provider_keeps_only_tls13_aead() {
        let provider = restricted_provider();
        assert!(!provider.cipher_suites.is_empty());
        for suite in &provider.cipher_suites {
            assert!(ALLOWED_SUITES.contains(&suite.suite()));
            assert!(suite.version() == &rustls::version::TLS13);
        }
    }

    #[test]
    fn test_missing_files_fail() {
        let files = TlsFiles {
            cert: PathBuf::from("/nonexistent/linodemcp/cert.pem"),
            key: PathBuf::from("/nonexistent/linodemcp/key.pem"),
        };
        let err = load_server_config(&files).unwrap_err();
        assert!(matches!(err, SidecarError::TlsConfig(_)));
        assert!(err.to_string().contains("cert.pem"));
    }

    #[test]
    fn test_garbage_certificate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let err = load_server_config(&TlsFiles { cert, key }).unwrap_err();
        assert!(matches!(err, SidecarError::TlsConfig(_)));
    }
}
