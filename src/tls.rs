//! TLS configuration for servers with a custom certificate authority.
//!
//! Self-hosted budget servers are commonly deployed behind a private CA or
//! a self-signed certificate. When the connection config carries a `cert`
//! path, this module builds a [`rustls::ClientConfig`] whose root store
//! trusts exactly the CAs in that PEM file; without one, the HTTP client
//! falls back to the standard webpki root store.

use std::path::Path;

use rustls::ClientConfig;

use crate::Result;

/// Builds a [`ClientConfig`] whose root store contains only the CA
/// certificates read from `ca_path`.
///
/// # Errors
///
/// Returns [`BursarError::Tls`](crate::BursarError::Tls) if the file cannot
/// be read, the PEM cannot be parsed, or it contains no certificate.
pub fn build_tls_config(ca_path: &Path) -> Result<ClientConfig> {
    let pem = std::fs::read(ca_path).map_err(|e| {
        crate::BursarError::Tls(format!("failed to read CA file {}: {e}", ca_path.display()))
    })?;

    let certs: Vec<_> = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| crate::BursarError::Tls(format!("failed to parse CA PEM: {e}")))?;

    if certs.is_empty() {
        return Err(crate::BursarError::Tls(format!(
            "no certificates found in {}",
            ca_path.display()
        )));
    }

    let mut root_store = rustls::RootCertStore::empty();
    root_store.add_parsable_certificates(certs);

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_a_tls_error() {
        let err = build_tls_config(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, crate::BursarError::Tls(_)));
    }

    #[test]
    fn empty_pem_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a certificate\n").unwrap();
        let err = build_tls_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("no certificates"));
    }
}
