use std::sync::Arc;

use tracing::{error, info, warn};

use bursar::client::BudgetClient;
use bursar::config::{self, ConnectionConfig};
use bursar::coordinator::RefreshCoordinator;
use bursar::credentials::{self, CredentialKey};
use bursar::sensor::{self, AccountSensor, BudgetSensor, Sensor};
use bursar::setup::{self, SetupFlow, SetupOutcome};
use bursar::{BursarError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    credentials::populate_env_from_keychain();

    let config = match config::fetch_config()? {
        Some(config) => config,
        None => run_wizard().await?,
    };

    let client = BudgetClient::new(config.clone())?;
    let coordinator = Arc::new(RefreshCoordinator::new(client));

    // Mandatory initial refresh: a failure here aborts setup entirely and
    // no sensors are created.
    if let Err(e) = coordinator.first_refresh().await {
        error!(
            error = %e,
            code = %setup::SetupError::from_error(&e),
            "initial refresh failed, aborting"
        );
        return Err(e);
    }

    let handle = coordinator.handle();
    let (accounts, budgets) = sensor::build_sensors(&handle, &config.unit);
    info!(
        title = %config.title(),
        accounts = accounts.len(),
        budgets = budgets.len(),
        "sensors published"
    );

    {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run().await });
    }

    let mut watcher = coordinator.handle();
    loop {
        report(&accounts, &budgets);
        if !watcher.changed().await {
            return Ok(());
        }
    }
}

/// Runs the interactive setup wizard until a connection test passes.
async fn run_wizard() -> Result<ConnectionConfig> {
    let mut flow = SetupFlow::new();
    loop {
        let input = setup::prompt_user_input()?;
        match flow.submit(input).await {
            SetupOutcome::Created(entry) => {
                persist_secrets(&entry.config);
                info!(title = %entry.title, "configuration created");
                return Ok(entry.config);
            }
            SetupOutcome::AlreadyConfigured => {
                return Err(BursarError::Config(
                    "this server and file are already configured".to_string(),
                ));
            }
            SetupOutcome::Failed(code) => {
                eprintln!("Setup failed: {code}. Check the values and try again.");
            }
        }
    }
}

/// Stores wizard secrets in the keychain so later starts skip the wizard.
fn persist_secrets(config: &ConnectionConfig) {
    if let Err(e) = credentials::save(CredentialKey::ServerPassword, config.password.as_str()) {
        warn!(error = %e, "could not store server password in keychain");
    }
    if let Some(encrypt_password) = &config.encrypt_password
        && let Err(e) = credentials::save(CredentialKey::EncryptPassword, encrypt_password.as_str())
    {
        warn!(error = %e, "could not store encryption password in keychain");
    }
}

/// Logs the current state of every published sensor.
fn report(accounts: &[AccountSensor], budgets: &[BudgetSensor]) {
    for sensor in accounts {
        info!(
            id = sensor.unique_id(),
            name = sensor.name(),
            value = ?sensor.value(),
            unit = sensor.unit_of_measurement(),
            "account sensor"
        );
    }
    for sensor in budgets {
        info!(
            id = sensor.unique_id(),
            name = sensor.name(),
            value = ?sensor.value(),
            attributes = ?sensor.attributes(),
            unit = sensor.unit_of_measurement(),
            "budget sensor"
        );
    }
}
