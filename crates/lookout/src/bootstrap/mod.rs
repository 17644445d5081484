//! First-run setup workflow.
//!
//! [`Bootstrap`] turns an unconfigured process into a running, database-backed
//! one. It is driven by two entry points, [`Bootstrap::render_setup`] and
//! [`Bootstrap::process_setup`], and both refuse to do anything once the
//! process is initialized.
//!
//! # Pipeline
//!
//! | Phase        | Step                                  | On failure                |
//! |--------------|---------------------------------------|---------------------------|
//! | Configuring  | build record, save, reload            | abort, config left as is  |
//! | Validating   | connect (non-strict)                  | abort, **config deleted** |
//! | Provisioning | create admin, project row, demo data  | abort (demo data: ignore) |
//! | Initialized  | flip state, rotate sessions, settle   | n/a                       |
//!
//! Every abort returns the attempted record with its error so the form can be
//! shown again. Nothing is retried automatically.

mod traits;


pub use traits::{Connector, LiveDatabase, SqlConnector};

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use lookout_db::DbError;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ConfigPersistence, ConfigRecord, EnvDefaults, SetupForm};
use crate::session::SessionKeys;
use crate::state::BootstrapState;
use crate::view::SetupView;

/// Wait between flipping to initialized and answering the request, giving
/// subsystems started by the flip time to come up.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Errors that abort (or, for `Seed`, merely blemish) a setup attempt.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid setup input: {0}")]
    Validation(String),

    #[error("Could not store configuration: {0}")]
    Persistence(#[source] ConfigError),

    #[error("Could not connect to database: {0}")]
    Connection(#[source] DbError),

    #[error("Could not create administrator: {0}")]
    Provisioning(#[source] DbError),

    #[error("Could not load sample data: {0}")]
    Seed(#[source] DbError),
}

/// Where a setup attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Unconfigured,
    Configuring,
    Validating,
    Provisioning,
    Initialized,
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapPhase::Unconfigured => "unconfigured",
            BootstrapPhase::Configuring => "configuring",
            BootstrapPhase::Validating => "validating",
            BootstrapPhase::Provisioning => "provisioning",
            BootstrapPhase::Initialized => "initialized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Directory for `config.yml` and any local database
    pub location: PathBuf,
    pub settle_delay: Duration,
}

impl BootstrapOptions {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Answer to a request for the setup page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupPage {
    /// Already initialized: send the caller to the application.
    Redirect,
    Form(SetupView),
}

/// Answer to a setup submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Already initialized; nothing was attempted.
    AlreadyConfigured,
    /// Setup finished; the caller's old session must be dropped.
    Completed,
    /// Setup aborted; show the attempt again.
    Failed(SetupView),
}

impl SetupOutcome {
    pub fn is_redirect(&self) -> bool {
        matches!(self, SetupOutcome::AlreadyConfigured | SetupOutcome::Completed)
    }
}

/// The setup workflow and the state it guards.
pub struct Bootstrap {
    state: Arc<BootstrapState>,
    sessions: Arc<SessionKeys>,
    store: Arc<dyn ConfigPersistence>,
    connector: Arc<dyn Connector>,
    options: BootstrapOptions,
    database: RwLock<Option<Arc<dyn LiveDatabase>>>,
}

impl Bootstrap {
    pub fn new(
        store: Arc<dyn ConfigPersistence>,
        connector: Arc<dyn Connector>,
        options: BootstrapOptions,
    ) -> Self {
        Self {
            state: Arc::new(BootstrapState::new()),
            sessions: Arc::new(SessionKeys::new()),
            store,
            connector,
            options,
            database: RwLock::new(None),
        }
    }

    pub fn state(&self) -> &Arc<BootstrapState> {
        &self.state
    }

    pub fn sessions(&self) -> &Arc<SessionKeys> {
        &self.sessions
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    /// The live database, once initialized.
    pub fn database(&self) -> Option<Arc<dyn LiveDatabase>> {
        self.database
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Setup page, prefilled from the process environment.
    pub fn render_setup(&self) -> SetupPage {
        self.render_setup_with(&EnvDefaults::from_env())
    }

    pub fn render_setup_with(&self, env: &EnvDefaults) -> SetupPage {
        if self.is_initialized() {
            return SetupPage::Redirect;
        }
        if env.is_present() {
            SetupPage::Form(SetupView::Prefilled(env.to_record(&self.options.location)))
        } else {
            SetupPage::Form(SetupView::Empty)
        }
    }

    /// Run the setup pipeline for one form submission.
    pub async fn process_setup(&self, form: SetupForm) -> SetupOutcome {
        if self.is_initialized() {
            debug!("Setup submitted after initialization, ignoring");
            return SetupOutcome::AlreadyConfigured;
        }

        let mut record = form.to_record(&self.options.location);
        match self.run(&record, form.wants_sample_data()).await {
            Ok(()) => SetupOutcome::Completed,
            Err(err) => {
                record.error = Some(err.to_string());
                SetupOutcome::Failed(SetupView::Error(record))
            }
        }
    }

    async fn run(&self, record: &ConfigRecord, sample_data: bool) -> Result<(), SetupError> {
        let mut phase = BootstrapPhase::Configuring;
        let result = self.pipeline(record, sample_data, &mut phase).await;
        if let Err(err) = &result {
            error!(phase = %phase, error = %err, "Setup failed");
        }
        result
    }

    async fn pipeline(
        &self,
        record: &ConfigRecord,
        sample_data: bool,
        phase: &mut BootstrapPhase,
    ) -> Result<(), SetupError> {
        info!(
            phase = %phase,
            connection = %record.connection,
            host = %record.host,
            database = %record.database,
            "Starting setup"
        );

        record
            .kind()
            .map_err(|e| SetupError::Validation(e.to_string()))?;
        if record.username.is_empty() {
            return Err(SetupError::Validation(
                "administrator username is required".to_string(),
            ));
        }

        self.store.save(record).map_err(SetupError::Persistence)?;
        let reloaded = self.store.load().map_err(SetupError::Persistence)?;

        enter(phase, BootstrapPhase::Validating);
        let db = match self.connect(&reloaded).await {
            Ok(db) => db,
            Err(err) => {
                // An unreachable database must not leave the install looking
                // configured.
                if let Err(delete_err) = self.store.delete() {
                    warn!(error = %delete_err, "Failed to remove config after connection error");
                }
                return Err(err);
            }
        };

        enter(phase, BootstrapPhase::Provisioning);
        db.create_admin(&record.admin_user())
            .await
            .map_err(SetupError::Provisioning)?;
        db.save_core(&record.core_info())
            .await
            .map_err(SetupError::Provisioning)?;
        if sample_data {
            if let Err(err) = db.load_sample_data().await {
                warn!(error = %SetupError::Seed(err), "Continuing without sample data");
            }
        }

        self.install(db);
        enter(phase, BootstrapPhase::Initialized);
        self.sessions.reset();

        info!(
            delay_ms = self.options.settle_delay.as_millis() as u64,
            "Setup complete, waiting for services to settle"
        );
        tokio::time::sleep(self.options.settle_delay).await;
        Ok(())
    }

    async fn connect(&self, record: &ConfigRecord) -> Result<Arc<dyn LiveDatabase>, SetupError> {
        let settings = record
            .connection_settings()
            .map_err(|e| SetupError::Validation(e.to_string()))?;
        self.connector
            .connect(&settings, false)
            .await
            .map_err(|e| {
                if e.is_invalid_input() {
                    SetupError::Validation(e.to_string())
                } else {
                    SetupError::Connection(e)
                }
            })
    }

    /// Keep the live database and flip the process to initialized.
    fn install(&self, db: Arc<dyn LiveDatabase>) {
        *self
            .database
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(db);
        if !self.state.mark_initialized() {
            warn!("Process was already initialized by a concurrent setup");
        }
    }

    /// Normal startup: adopt an existing config if its database answers.
    ///
    /// Returns `Ok(false)` when there is no config yet. Unlike setup this
    /// connects strictly: the database must already exist.
    pub async fn resume(&self) -> Result<bool, SetupError> {
        if self.is_initialized() {
            return Ok(true);
        }
        if !self.store.exists() {
            debug!("No config found, setup required");
            return Ok(false);
        }

        let record = self.store.load().map_err(SetupError::Persistence)?;
        let settings = record
            .connection_settings()
            .map_err(|e| SetupError::Validation(e.to_string()))?;
        let db = self
            .connector
            .connect(&settings, true)
            .await
            .map_err(SetupError::Connection)?;

        self.install(db);
        info!(connection = %record.connection, "Resumed existing configuration");
        Ok(true)
    }
}

fn enter(phase: &mut BootstrapPhase, next: BootstrapPhase) {
    debug!(from = %phase, to = %next, "Setup phase");
    *phase = next;
}
