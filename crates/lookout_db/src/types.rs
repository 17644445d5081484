//! Types shared between the storage layer and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// Engine Selection
// ============================================================================

/// Supported storage engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    Postgres,
    Mysql,
    Sqlite,
}

/// Well-known MySQL port.
pub const MYSQL_DEFAULT_PORT: u16 = 3306;

/// Well-known PostgreSQL port, also the fallback for every other engine.
pub const POSTGRES_DEFAULT_PORT: u16 = 5432;

/// Default port for a raw connection identifier.
///
/// Only the literal `mysql` maps to 3306; anything else, including an
/// empty or unknown identifier, maps to 5432.
pub fn default_port_for(connection: &str) -> u16 {
    match connection.parse::<DbKind>() {
        Ok(kind) => kind.default_port(),
        Err(_) => POSTGRES_DEFAULT_PORT,
    }
}

impl DbKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbKind::Postgres => "postgres",
            DbKind::Mysql => "mysql",
            DbKind::Sqlite => "sqlite",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            DbKind::Mysql => MYSQL_DEFAULT_PORT,
            DbKind::Postgres | DbKind::Sqlite => POSTGRES_DEFAULT_PORT,
        }
    }

    /// URL scheme understood by the sqlx `Any` driver.
    pub(crate) fn scheme(&self) -> &'static str {
        match self {
            DbKind::Postgres => "postgres",
            DbKind::Mysql => "mysql",
            DbKind::Sqlite => "sqlite",
        }
    }

    /// Cargo feature that compiles this engine's driver in.
    pub(crate) fn feature(&self) -> &'static str {
        self.as_str()
    }

    pub(crate) fn is_compiled(&self) -> bool {
        match self {
            DbKind::Postgres => cfg!(feature = "postgres"),
            DbKind::Mysql => cfg!(feature = "mysql"),
            DbKind::Sqlite => cfg!(feature = "sqlite"),
        }
    }

    /// Rewrite `?` placeholders into the engine's bind syntax.
    pub(crate) fn sql(&self, query: &str) -> String {
        if *self != DbKind::Postgres {
            return query.to_string();
        }
        let mut out = String::with_capacity(query.len() + 8);
        let mut index = 0;
        for ch in query.chars() {
            if ch == '?' {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a connection identifier is not a supported engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDbKind(pub String);

impl fmt::Display for UnknownDbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported database connection '{}'", self.0)
    }
}

impl std::error::Error for UnknownDbKind {}

impl FromStr for DbKind {
    type Err = UnknownDbKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DbKind::Postgres),
            "mysql" => Ok(DbKind::Mysql),
            "sqlite" | "sqlite3" => Ok(DbKind::Sqlite),
            other => Err(UnknownDbKind(other.to_string())),
        }
    }
}

/// Everything needed to reach a storage engine.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub kind: DbKind,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    /// Directory holding local state; the sqlite file lives here.
    pub location: PathBuf,
}

impl ConnectionSettings {
    /// Port to dial, substituting the engine default for zero.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            self.kind.default_port()
        } else {
            self.port
        }
    }

    /// Path of the sqlite database file.
    pub fn sqlite_path(&self) -> PathBuf {
        self.location.join(SQLITE_FILE_NAME)
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("location", &self.location)
            .finish()
    }
}

/// File name of the sqlite database inside the configured location.
pub const SQLITE_FILE_NAME: &str = "lookout.db";

// ============================================================================
// Accounts
// ============================================================================

/// An account to be created. The password is plain text until
/// [`crate::Database::create_user`] hashes it.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub admin: bool,
}

impl NewUser {
    /// The initial administrator.
    pub fn admin(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: email.into(),
            admin: true,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

/// A stored account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub admin: bool,
    /// PHC-formatted argon2 hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Milliseconds since Unix epoch
    pub created_at: i64,
}

// ============================================================================
// Project Metadata
// ============================================================================

/// Project metadata shown by the running application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreInfo {
    pub name: String,
    pub description: String,
    pub domain: String,
}

// ============================================================================
// Monitoring Records
// ============================================================================

/// How a service is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Http,
    Tcp,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Http => "http",
            CheckType::Tcp => "tcp",
        }
    }
}

/// A monitored endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub check_type: String,
    pub method: String,
    pub expected_status: i64,
    pub check_interval_secs: i64,
    pub timeout_secs: i64,
    pub port: i64,
}
