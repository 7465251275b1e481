//! Connection configuration loaded from environment variables.
//!
//! A daemon start reads the full connection config from the environment:
//! - `BURSAR_ENDPOINT`: budget server base URL
//! - `BURSAR_PASSWORD`: server password
//! - `BURSAR_FILE`: budget file (dataset) identifier
//! - `BURSAR_UNIT`: display unit symbol (optional, defaults to `$`)
//! - `BURSAR_CERT`: path to a custom CA certificate PEM (optional)
//! - `BURSAR_ENCRYPT_PASSWORD`: file encryption password (optional)
//!
//! When the required variables are absent the daemon falls back to the
//! interactive setup wizard (see [`crate::setup`]). Secrets are wrapped in
//! [`Zeroizing`] and redacted from `Debug` output.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::Result;

/// Default display unit symbol.
pub const DEFAULT_UNIT: &str = "$";

const ENDPOINT_VAR: &str = "BURSAR_ENDPOINT";
const PASSWORD_VAR: &str = "BURSAR_PASSWORD";
const FILE_VAR: &str = "BURSAR_FILE";
const UNIT_VAR: &str = "BURSAR_UNIT";
const CERT_VAR: &str = "BURSAR_CERT";
const ENCRYPT_PASSWORD_VAR: &str = "BURSAR_ENCRYPT_PASSWORD";

/// Validated connection parameters for one budget server file.
///
/// Immutable once constructed; the setup wizard builds one after a
/// successful connection test and it is read-only from then on.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub password: Zeroizing<String>,
    pub file: String,
    pub unit: String,
    pub cert: Option<PathBuf>,
    pub encrypt_password: Option<Zeroizing<String>>,
}

impl ConnectionConfig {
    /// Validates and builds a connection config.
    ///
    /// # Errors
    ///
    /// Returns [`BursarError::Config`](crate::BursarError::Config) if the
    /// endpoint is not a valid `http`/`https` URL or a required field is
    /// empty.
    pub fn new(
        endpoint: impl Into<String>,
        password: Zeroizing<String>,
        file: impl Into<String>,
        unit: impl Into<String>,
        cert: Option<PathBuf>,
        encrypt_password: Option<Zeroizing<String>>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let file = file.into();
        let unit = unit.into();

        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| crate::BursarError::Config(format!("invalid endpoint URL: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(crate::BursarError::Config(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if file.trim().is_empty() {
            return Err(crate::BursarError::Config(
                "file identifier must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(crate::BursarError::Config(
                "password must not be empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            password,
            file,
            unit,
            cert,
            encrypt_password,
        })
    }

    /// Identity key for this server/file pair, used to reject duplicate
    /// setup submissions: lower-cased `endpoint + "_" + file`.
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.endpoint.to_lowercase(), self.file.to_lowercase())
    }

    /// Display title in the form `"{host}:{port} {file}"`.
    pub fn title(&self) -> String {
        match reqwest::Url::parse(&self.endpoint) {
            Ok(url) => {
                let host = url.host_str().unwrap_or(&self.endpoint).to_string();
                match url.port_or_known_default() {
                    Some(port) => format!("{host}:{port} {}", self.file),
                    None => format!("{host} {}", self.file),
                }
            }
            // new() guarantees a parseable endpoint; fall back verbatim.
            Err(_) => format!("{} {}", self.endpoint, self.file),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("password", &"<redacted>")
            .field("file", &self.file)
            .field("unit", &self.unit)
            .field("cert", &self.cert)
            .field(
                "encrypt_password",
                &self.encrypt_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Loads the connection configuration from environment variables.
///
/// Returns `Ok(None)` when no `BURSAR_*` connection variable is set at all
/// (the caller should fall back to the setup wizard).
///
/// # Errors
///
/// Returns [`BursarError::Config`](crate::BursarError::Config) if only part
/// of the required endpoint/password/file triple is present, or if the
/// present values fail validation.
pub fn fetch_config() -> Result<Option<ConnectionConfig>> {
    let endpoint = non_empty_var(ENDPOINT_VAR);
    let password = non_empty_var(PASSWORD_VAR);
    let file = non_empty_var(FILE_VAR);

    let (endpoint, password, file) = match (endpoint, password, file) {
        (None, None, None) => return Ok(None),
        (Some(e), Some(p), Some(f)) => (e, p, f),
        (e, p, f) => {
            let missing: Vec<&str> = [
                (e.is_none(), ENDPOINT_VAR),
                (p.is_none(), PASSWORD_VAR),
                (f.is_none(), FILE_VAR),
            ]
            .into_iter()
            .filter_map(|(absent, name)| absent.then_some(name))
            .collect();
            return Err(crate::BursarError::Config(format!(
                "incomplete connection config: missing {}",
                missing.join(", ")
            )));
        }
    };

    let unit = non_empty_var(UNIT_VAR).unwrap_or_else(|| DEFAULT_UNIT.to_string());
    let cert = non_empty_var(CERT_VAR).map(PathBuf::from);
    let encrypt_password = non_empty_var(ENCRYPT_PASSWORD_VAR).map(Zeroizing::new);

    ConnectionConfig::new(
        endpoint,
        Zeroizing::new(password),
        file,
        unit,
        cert,
        encrypt_password,
    )
    .map(Some)
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
