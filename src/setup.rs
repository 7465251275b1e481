//! Connection setup wizard.
//!
//! One-shot validation flow run before any coordinator exists: collect
//! candidate connection parameters, reject duplicates of an already
//! configured server/file identity, attempt a real session open, and map
//! each typed failure to a user-facing error code. Only a successful test
//! produces a [`ConfigEntry`].

use std::collections::HashSet;
use std::io::Write as _;
use std::path::PathBuf;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::client::BudgetClient;
use crate::config::{ConnectionConfig, DEFAULT_UNIT};
use crate::{BursarError, Result};

/// User-facing error codes shown when the connection test fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    FailedSsl,
    FailedConnection,
    FailedAuth,
    FailedFile,
}

impl SetupError {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::FailedSsl => "failed_ssl",
            Self::FailedConnection => "failed_connection",
            Self::FailedAuth => "failed_auth",
            Self::FailedFile => "failed_file",
        }
    }

    /// Maps a typed adapter failure onto its user-facing code.
    pub fn from_error(error: &BursarError) -> Self {
        match error {
            BursarError::Tls(_) => Self::FailedSsl,
            BursarError::Auth(_) => Self::FailedAuth,
            BursarError::InvalidDataset(_) => Self::FailedFile,
            _ => Self::FailedConnection,
        }
    }
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw wizard form input.
#[derive(Clone)]
pub struct UserInput {
    pub endpoint: String,
    pub password: Zeroizing<String>,
    pub file: String,
    pub unit: String,
    pub cert: Option<PathBuf>,
    pub encrypt_password: Option<Zeroizing<String>>,
}

/// Persisted result of a successful setup.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    /// Display title, `"{host}:{port} {file}"`.
    pub title: String,
    /// Identity key, lower-cased `endpoint + "_" + file`.
    pub unique_id: String,
    pub config: ConnectionConfig,
}

/// Outcome of one wizard submission.
#[derive(Debug)]
pub enum SetupOutcome {
    /// Connection test passed; the entry was registered.
    Created(ConfigEntry),
    /// The same server/file identity is already configured.
    AlreadyConfigured,
    /// The connection test failed with the given code; the form should be
    /// shown again.
    Failed(SetupError),
}

/// The wizard state: which identities are already configured.
#[derive(Default)]
pub struct SetupFlow {
    configured: HashSet<String>,
}

impl SetupFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the flow with identities configured in earlier runs.
    pub fn with_configured<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            configured: ids.into_iter().collect(),
        }
    }

    /// Validates one submission end to end.
    ///
    /// Duplicate identities are rejected before any network traffic. The
    /// connection test opens and immediately closes a real session; its
    /// typed failure is mapped to a [`SetupError`] code rather than
    /// propagated.
    pub async fn submit(&mut self, input: UserInput) -> SetupOutcome {
        let config = match ConnectionConfig::new(
            input.endpoint,
            input.password,
            input.file,
            input.unit,
            input.cert,
            input.encrypt_password,
        ) {
            Ok(config) => config,
            Err(e) => {
                debug!(error = %e, "rejected invalid setup input");
                return SetupOutcome::Failed(SetupError::FailedConnection);
            }
        };

        let unique_id = config.unique_id();
        if self.configured.contains(&unique_id) {
            debug!(%unique_id, "duplicate setup submission rejected");
            return SetupOutcome::AlreadyConfigured;
        }

        if let Err(e) = test_connection(&config).await {
            let code = SetupError::from_error(&e);
            info!(error = %e, code = %code, "setup connection test failed");
            return SetupOutcome::Failed(code);
        }

        let entry = ConfigEntry {
            title: config.title(),
            unique_id: unique_id.clone(),
            config,
        };
        self.configured.insert(unique_id);
        info!(title = %entry.title, "setup complete");
        SetupOutcome::Created(entry)
    }
}

/// Opens and immediately closes a session to prove the parameters work.
async fn test_connection(config: &ConnectionConfig) -> Result<()> {
    let client = BudgetClient::new(config.clone())?;
    let session = client.open().await?;
    session.close().await;
    Ok(())
}

/// Collects wizard input interactively from the terminal.
///
/// Secrets are read without echo. Empty optional fields are treated as
/// absent; the unit defaults to [`DEFAULT_UNIT`].
///
/// # Errors
///
/// Returns [`BursarError::Config`] if stdin/stdout are unusable.
pub fn prompt_user_input() -> Result<UserInput> {
    println!("No connection configured, starting setup.");
    let endpoint = prompt_line("Server endpoint URL")?;
    let password = Zeroizing::new(prompt_secret("Server password")?);
    let file = prompt_line("Budget file")?;

    let unit = prompt_line_optional(&format!("Display unit [{DEFAULT_UNIT}]"))?
        .unwrap_or_else(|| DEFAULT_UNIT.to_string());
    let cert = prompt_line_optional("Custom CA certificate path [none]")?.map(PathBuf::from);
    let encrypt_password = {
        let value = prompt_secret("File encryption password [none]")?;
        (!value.is_empty()).then(|| Zeroizing::new(value))
    };

    Ok(UserInput {
        endpoint,
        password,
        file,
        unit,
        cert,
        encrypt_password,
    })
}

fn prompt_line(label: &str) -> Result<String> {
    loop {
        if let Some(value) = prompt_line_optional(label)? {
            return Ok(value);
        }
        println!("A value is required.");
    }
}

fn prompt_line_optional(label: &str) -> Result<Option<String>> {
    print!("{label}: ");
    std::io::stdout()
        .flush()
        .map_err(|e| BursarError::Config(format!("failed to write prompt: {e}")))?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| BursarError::Config(format!("failed to read setup input: {e}")))?;
    let value = line.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn prompt_secret(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: "))
        .map_err(|e| BursarError::Config(format!("failed to read setup input: {e}")))
}
