//! HTTP session adapter for the budget server.
//!
//! [`BudgetClient::open`] exchanges the configured password for a session
//! token and validates the configured file against the server's file
//! listing; the resulting [`Session`] exposes the typed fetch operations.
//! A session lives for exactly one refresh cycle: the coordinator opens a
//! fresh one per tick and guarantees [`Session::close`] runs on every exit
//! path.
//!
//! All failures surface as the typed variants `Auth`, `Tls`, `Connection`,
//! and `InvalidDataset`; nothing here retries internally.

pub mod wire;

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::coordinator::SnapshotSource;
use crate::{BursarError, Result};
use wire::{
    AccountRecord, BudgetRecord, Envelope, LoginData, LoginRequest, MonthData, RawSnapshot,
    UserFile,
};

/// Session token header expected by the server on authenticated requests.
const TOKEN_HEADER: &str = "X-ACTUAL-TOKEN";

/// File password header required for end-to-end encrypted files.
const FILE_PASSWORD_HEADER: &str = "X-ACTUAL-FILE-PASSWORD";

/// HTTP client bound to one server/file configuration.
pub struct BudgetClient {
    config: ConnectionConfig,
    http: reqwest::Client,
    base: reqwest::Url,
}

impl BudgetClient {
    /// Builds the HTTP client for the given connection config.
    ///
    /// When the config carries a custom CA certificate path, the client is
    /// preconfigured with a rustls config trusting exactly that CA (see
    /// [`crate::tls`]).
    ///
    /// # Errors
    ///
    /// Returns [`BursarError::Tls`] if the CA file is unusable, or
    /// [`BursarError::Connection`] if the HTTP client cannot be built.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let base = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| BursarError::Config(format!("invalid endpoint URL: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(ca_path) = &config.cert {
            let tls_config = crate::tls::build_tls_config(ca_path)?;
            builder = builder.use_preconfigured_tls(tls_config);
        }
        let http = builder
            .build()
            .map_err(|e| BursarError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http, base })
    }

    /// The connection config this client was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a session: logs in and validates the configured file.
    ///
    /// # Errors
    ///
    /// - [`BursarError::Auth`]: the server rejected the password
    /// - [`BursarError::Tls`]: the TLS handshake failed
    /// - [`BursarError::Connection`]: the server is unreachable
    /// - [`BursarError::InvalidDataset`]: the file is unknown, deleted, or
    ///   encrypted without a configured encryption password
    pub async fn open(&self) -> Result<Session<'_>> {
        let token = self.login().await?;
        let file = self.resolve_file(&token).await?;
        info!(file = %file.file_id, "opened budget server session");
        Ok(Session {
            client: self,
            token,
            file_id: file.file_id,
        })
    }

    async fn login(&self) -> Result<String> {
        let url = self.url(&["account", "login"])?;
        let request = LoginRequest {
            password: self.config.password.as_str(),
        };
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response)?;
        let envelope: Envelope<LoginData> = response.json().await.map_err(classify_transport)?;
        let data = envelope.into_result()?;
        debug!("obtained session token");
        Ok(data.token)
    }

    /// Resolves the configured file identifier against the server's file
    /// listing, matching on file id or display name (case-insensitive).
    async fn resolve_file(&self, token: &str) -> Result<UserFile> {
        let url = self.url(&["sync", "list-user-files"])?;
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response)?;
        let envelope: Envelope<Vec<UserFile>> =
            response.json().await.map_err(classify_transport)?;
        let files = envelope.into_result()?;

        let wanted = self.config.file.to_lowercase();
        let file = files
            .into_iter()
            .filter(|f| !f.deleted)
            .find(|f| f.file_id.to_lowercase() == wanted || f.name.to_lowercase() == wanted)
            .ok_or_else(|| {
                BursarError::InvalidDataset(format!(
                    "file '{}' not found on server",
                    self.config.file
                ))
            })?;

        if file.encrypt_key_id.is_some() && self.config.encrypt_password.is_none() {
            return Err(BursarError::InvalidDataset(format!(
                "file '{}' is encrypted and no encryption password is configured",
                file.name
            )));
        }

        Ok(file)
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BursarError::Config("endpoint URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// An authenticated session scoped to a single refresh cycle.
pub struct Session<'c> {
    client: &'c BudgetClient,
    token: String,
    file_id: String,
}

impl Session<'_> {
    /// Fetches all account rows for the file.
    ///
    /// # Errors
    ///
    /// Returns the adapter's typed failures; see [`BudgetClient::open`].
    pub async fn fetch_accounts(&self) -> Result<Vec<AccountRecord>> {
        let url = self.client.url(&["budgets", &self.file_id, "accounts"])?;
        let envelope: Envelope<Vec<AccountRecord>> = self.get_json(url).await?;
        envelope.into_result()
    }

    /// Fetches the budget rows for the month containing `as_of`.
    ///
    /// # Errors
    ///
    /// Returns the adapter's typed failures; see [`BudgetClient::open`].
    pub async fn fetch_budgets(&self, as_of: NaiveDate) -> Result<Vec<BudgetRecord>> {
        let month = as_of.format("%Y-%m").to_string();
        let url = self
            .client
            .url(&["budgets", &self.file_id, "months", &month])?;
        let envelope: Envelope<MonthData> = self.get_json(url).await?;
        Ok(envelope.into_result()?.budgets)
    }

    /// Terminates the session server-side, best effort.
    ///
    /// Logout failures are logged and never propagated; the token simply
    /// expires on the server.
    pub async fn close(self) {
        let url = match self.client.url(&["account", "logout"]) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "skipping logout, could not build URL");
                return;
            }
        };
        match self
            .client
            .http
            .post(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
        {
            Ok(_) => debug!("closed budget server session"),
            Err(e) => warn!(error = %e, "logout failed, dropping session"),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<Envelope<T>> {
        let mut request = self.client.http.get(url).header(TOKEN_HEADER, &self.token);
        if let Some(file_password) = &self.client.config.encrypt_password {
            request = request.header(FILE_PASSWORD_HEADER, file_password.as_str());
        }
        let response = request.send().await.map_err(classify_transport)?;
        let response = check_status(response)?;
        response.json().await.map_err(classify_transport)
    }
}

impl SnapshotSource for BudgetClient {
    /// One full fetch cycle: open a fresh session, pull accounts and
    /// budgets, close the session on every exit path.
    fn fetch<'a>(
        &'a self,
        as_of: NaiveDate,
    ) -> Pin<Box<dyn Future<Output = Result<RawSnapshot>> + Send + 'a>> {
        Box::pin(async move {
            let session = self.open().await?;
            let fetched = async {
                let accounts = session.fetch_accounts().await?;
                let budgets = session.fetch_budgets(as_of).await?;
                Ok(RawSnapshot { accounts, budgets })
            }
            .await;
            session.close().await;
            fetched
        })
    }
}

/// Maps HTTP status codes onto the adapter's typed failures.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BursarError::Auth(format!("server returned {status}")));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(BursarError::InvalidDataset(
            "server returned 404 for the requested resource".to_string(),
        ));
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(BursarError::Connection(format!("server returned {status}")));
    }
    Ok(response)
}

/// Classifies a transport-level error into the typed failure surface.
///
/// reqwest folds connect, TLS, and body failures into a single error type;
/// TLS problems are recognized by walking the source chain.
fn classify_transport(e: reqwest::Error) -> BursarError {
    if is_tls_error(&e) {
        return BursarError::Tls(e.to_string());
    }
    if e.is_decode() {
        return BursarError::Connection(format!("malformed server response: {e}"));
    }
    BursarError::Connection(e.to_string())
}

fn is_tls_error(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if err.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        let text = err.to_string();
        if text.contains("certificate") || text.contains("CertificateError") {
            return true;
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, DEFAULT_UNIT};
    use zeroize::Zeroizing;

    fn client(endpoint: &str) -> BudgetClient {
        let config = ConnectionConfig::new(
            endpoint,
            Zeroizing::new("pw".to_string()),
            "main",
            DEFAULT_UNIT,
            None,
            None,
        )
        .unwrap();
        BudgetClient::new(config).unwrap()
    }

    #[test]
    fn urls_are_joined_onto_the_endpoint_path() {
        let client = client("https://budget.example.com:5007/actual");
        let url = client.url(&["account", "login"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://budget.example.com:5007/actual/account/login"
        );
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let client = client("https://budget.example.com/");
        let url = client.url(&["sync", "list-user-files"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://budget.example.com/sync/list-user-files"
        );
    }

    #[test]
    fn month_path_uses_year_dash_month() {
        let as_of = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(as_of.format("%Y-%m").to_string(), "2026-08");
    }
}
