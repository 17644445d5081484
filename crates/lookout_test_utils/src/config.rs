//! Database configuration types for test infrastructure.

use std::fmt;
use std::path::Path;

use lookout_db::{ConnectionSettings, DbKind};

/// Database server version for multi-engine testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbVersion {
    /// PostgreSQL 16
    Postgres16,
    /// MySQL 8
    Mysql8,
}

impl DbVersion {
    /// Get the docker-compose service name for this version.
    pub fn service_name(&self) -> &'static str {
        match self {
            DbVersion::Postgres16 => "postgres16",
            DbVersion::Mysql8 => "mysql8",
        }
    }

    /// Get the host port for this version.
    pub fn port(&self) -> u16 {
        match self {
            DbVersion::Postgres16 => 15434,
            DbVersion::Mysql8 => 13306,
        }
    }

    pub fn kind(&self) -> DbKind {
        match self {
            DbVersion::Postgres16 => DbKind::Postgres,
            DbVersion::Mysql8 => DbKind::Mysql,
        }
    }

    pub fn all() -> &'static [DbVersion] {
        &[DbVersion::Postgres16, DbVersion::Mysql8]
    }
}

impl fmt::Display for DbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbVersion::Postgres16 => write!(f, "PostgreSQL 16"),
            DbVersion::Mysql8 => write!(f, "MySQL 8"),
        }
    }
}

/// Credentials for a test database server.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub version: DbVersion,
    /// Host (defaults to 127.0.0.1)
    pub host: String,
    /// Database name (defaults to lookout_test)
    pub database: String,
    pub username: String,
    pub password: String,
}

impl TestDbConfig {
    /// Config for the given version with the compose file's credentials.
    ///
    /// MySQL connects as root so tests may create databases.
    pub fn new(version: DbVersion) -> Self {
        let username = match version {
            DbVersion::Postgres16 => "lookout",
            DbVersion::Mysql8 => "root",
        };
        Self {
            version,
            host: "127.0.0.1".to_string(),
            database: "lookout_test".to_string(),
            username: username.to_string(),
            password: "lookout_test".to_string(),
        }
    }

    /// Use a fresh database name so tests don't see each other's rows.
    pub fn with_unique_database(mut self) -> Self {
        self.database = format!("lookout_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        self
    }

    /// Connection settings for `lookout_db::connect`.
    pub fn settings(&self, location: &Path) -> ConnectionSettings {
        ConnectionSettings {
            kind: self.version.kind(),
            host: self.host.clone(),
            user: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            port: self.version.port(),
            location: location.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports() {
        assert_eq!(DbVersion::Postgres16.port(), 15434);
        assert_eq!(DbVersion::Mysql8.port(), 13306);
    }

    #[test]
    fn test_settings() {
        let config = TestDbConfig::new(DbVersion::Mysql8);
        let settings = config.settings(Path::new("/tmp/lookout"));
        assert_eq!(settings.kind, DbKind::Mysql);
        assert_eq!(settings.user, "root");
        assert_eq!(settings.port, 13306);
    }

    #[test]
    fn test_unique_database_names() {
        let a = TestDbConfig::new(DbVersion::Postgres16).with_unique_database();
        let b = TestDbConfig::new(DbVersion::Postgres16).with_unique_database();
        assert_ne!(a.database, b.database);
        assert!(a
            .database
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
