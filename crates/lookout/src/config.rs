//! Installation parameters and their durable copy on disk.
//!
//! A [`ConfigRecord`] is built fresh from the setup form on every attempt.
//! [`ConfigStore`] writes it to `config.yml` in the configured location; the
//! running service reads that file back on later starts.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use lookout_db::{default_port_for, ConnectionSettings, CoreInfo, DbKind, NewUser, UnknownDbKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of the durable config inside the configured location.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Admin username offered when the form is prefilled from the environment.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Form value of `sample_data` that asks for demo records.
const SAMPLE_DATA_ON: &str = "on";

/// Config store errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// ConfigRecord
// ============================================================================

/// Installation parameters collected by the setup form.
///
/// The admin password and the last error never reach disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Engine identifier as entered (`postgres`, `mysql`, `sqlite`)
    pub connection: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Zero means "engine default"; see [`ConfigRecord::normalize`]
    pub port: u16,
    pub project: String,
    pub description: String,
    pub domain: String,
    pub email: String,
    /// Administrator username
    pub username: String,
    #[serde(skip)]
    pub admin_password: String,
    /// Directory holding this file and any local database
    pub location: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Message from the last failed attempt, shown back to the operator
    #[serde(skip)]
    pub error: Option<String>,
}

impl ConfigRecord {
    /// Parsed engine kind.
    pub fn kind(&self) -> Result<DbKind, UnknownDbKind> {
        self.connection.parse()
    }

    /// Substitute the engine default for an unset port.
    pub fn normalize(&mut self) {
        if self.port == 0 {
            self.port = default_port_for(&self.connection);
        }
    }

    pub fn connection_settings(&self) -> Result<ConnectionSettings, UnknownDbKind> {
        Ok(ConnectionSettings {
            kind: self.kind()?,
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            port: self.port,
            location: PathBuf::from(&self.location),
        })
    }

    /// The administrator account this record asks for.
    pub fn admin_user(&self) -> NewUser {
        NewUser::admin(
            self.username.trim(),
            self.admin_password.as_str(),
            self.email.as_str(),
        )
    }

    pub fn core_info(&self) -> CoreInfo {
        CoreInfo {
            name: self.project.clone(),
            description: self.description.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("connection", &self.connection)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("project", &self.project)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("location", &self.location)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Raw fields posted by the setup form. Missing fields decode as empty.
#[derive(Debug, Clone, Default)]
pub struct SetupForm {
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_database: String,
    pub db_connection: String,
    pub db_port: String,
    pub project: String,
    pub username: String,
    pub password: String,
    pub sample_data: String,
    pub description: String,
    pub domain: String,
    pub email: String,
}

impl SetupForm {
    /// Build from decoded form pairs. The first value of a repeated field
    /// wins; unknown fields are ignored and missing ones stay empty.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        let mut seen = HashSet::new();
        for (key, value) in pairs {
            let Some(slot) = form.field_mut(&key) else {
                continue;
            };
            if seen.insert(key) {
                *slot = value;
            }
        }
        form
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            "db_host" => &mut self.db_host,
            "db_user" => &mut self.db_user,
            "db_password" => &mut self.db_password,
            "db_database" => &mut self.db_database,
            "db_connection" => &mut self.db_connection,
            "db_port" => &mut self.db_port,
            "project" => &mut self.project,
            "username" => &mut self.username,
            "password" => &mut self.password,
            "sample_data" => &mut self.sample_data,
            "description" => &mut self.description,
            "domain" => &mut self.domain,
            "email" => &mut self.email,
            _ => return None,
        };
        Some(slot)
    }

    pub fn wants_sample_data(&self) -> bool {
        self.sample_data == SAMPLE_DATA_ON
    }

    /// Build a fresh record. Only type coercion happens here: a port that is
    /// not a number in `1..=65535` becomes 0 and is later replaced by the
    /// engine default.
    pub fn to_record(&self, location: &Path) -> ConfigRecord {
        ConfigRecord {
            connection: self.db_connection.trim().to_string(),
            host: self.db_host.trim().to_string(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_database.trim().to_string(),
            port: coerce_port(&self.db_port),
            project: self.project.clone(),
            description: self.description.clone(),
            domain: self.domain.clone(),
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            admin_password: self.password.clone(),
            location: location.display().to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            error: None,
        }
    }
}

fn coerce_port(raw: &str) -> u16 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    match raw.parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!(port = raw, "Ignoring malformed port, using engine default");
            0
        }
    }
}

/// Installation defaults supplied through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub connection: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub project: String,
    pub description: String,
}

impl EnvDefaults {
    /// Read `DB_CONN`, `DB_HOST`, `DB_USER`, `DB_PASS`, `DB_DATABASE`, `NAME`
    /// and `DESCRIPTION` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            connection: get("DB_CONN"),
            host: get("DB_HOST"),
            user: get("DB_USER"),
            password: get("DB_PASS"),
            database: get("DB_DATABASE"),
            project: get("NAME"),
            description: get("DESCRIPTION"),
        }
    }

    /// Defaults only count when an engine is named.
    pub fn is_present(&self) -> bool {
        !self.connection.is_empty()
    }

    pub fn to_record(&self, location: &Path) -> ConfigRecord {
        ConfigRecord {
            connection: self.connection.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            port: default_port_for(&self.connection),
            project: self.project.clone(),
            description: self.description.clone(),
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            location: location.display().to_string(),
            ..ConfigRecord::default()
        }
    }
}

// ============================================================================
// ConfigStore
// ============================================================================

/// Durable storage for the installation record.
pub trait ConfigPersistence: Send + Sync {
    /// Write the record, replacing any existing copy.
    fn save(&self, record: &ConfigRecord) -> Result<(), ConfigError>;

    /// Read the record back, normalized.
    fn load(&self) -> Result<ConfigRecord, ConfigError>;

    /// Remove the record. Absence is not an error.
    fn delete(&self) -> Result<(), ConfigError>;

    fn exists(&self) -> bool;
}

/// `config.yml` in a directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }
}

impl ConfigPersistence for ConfigStore {
    fn save(&self, record: &ConfigRecord) -> Result<(), ConfigError> {
        let path = self.path();
        std::fs::create_dir_all(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;

        let mut durable = record.clone();
        if durable.api_key.is_empty() {
            durable.api_key = uuid::Uuid::new_v4().simple().to_string();
        }
        if durable.api_secret.is_empty() {
            durable.api_secret = uuid::Uuid::new_v4().simple().to_string();
        }
        let yaml = serde_yaml::to_string(&durable)?;

        // Write beside the target and rename so readers never see half a file.
        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;
        tmp.write_all(yaml.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ConfigError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| ConfigError::io(&path, e.error))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    fn load(&self) -> Result<ConfigRecord, ConfigError> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path))
            }
            Err(e) => return Err(ConfigError::io(&path, e)),
        };
        let mut record: ConfigRecord =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.clone(),
                source,
            })?;
        record.normalize();
        debug!(path = %path.display(), "Loaded config");
        Ok(record)
    }

    fn delete(&self) -> Result<(), ConfigError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted config");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::io(&path, e)),
        }
    }

    fn exists(&self) -> bool {
        self.path().is_file()
    }
}
