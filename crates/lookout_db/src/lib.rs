//! Storage layer for Lookout
//!
//! Every database access in Lookout goes through this crate. The engine is
//! chosen at runtime from [`ConnectionSettings::kind`]; the sqlx `Any` driver
//! carries the connection so one [`Database`] type serves PostgreSQL, MySQL
//! and SQLite alike.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lookout_db::{connect, ConnectionSettings, DbKind, NewUser};
//!
//! let db = connect(&settings, false).await?;
//! db.create_user(&NewUser::admin("admin", "secret", "ops@example.com")).await?;
//! db.load_sample_data().await?;
//! ```

mod error;
mod pool;
mod sample;
mod schema;
mod types;
mod users;

pub use error::{DbError, Result};
pub use pool::{connect, connection_url};
pub use types::*;
pub use users::verify_password;

use sqlx::AnyPool;

/// A live, schema-verified connection to the configured engine.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    kind: DbKind,
}

impl Database {
    pub(crate) fn new(pool: AnyPool, kind: DbKind) -> Self {
        Self { pool, kind }
    }

    /// Engine this database runs on.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Trivial round-trip proving the engine still answers.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// Project metadata
impl Database {
    /// Replace the single project metadata row.
    pub async fn save_core(&self, core: &CoreInfo) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM core").execute(&mut *tx).await?;
        sqlx::query(&self.kind.sql(
            "INSERT INTO core (name, description, domain, created_at) VALUES (?, ?, ?, ?)",
        ))
        .bind(core.name.as_str())
        .bind(core.description.as_str())
        .bind(core.domain.as_str())
        .bind(Self::now_millis())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Read the project metadata row, if setup has written one.
    pub async fn core(&self) -> Result<Option<CoreInfo>> {
        use sqlx::Row;

        let row = sqlx::query("SELECT name, description, domain FROM core")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| -> Result<CoreInfo> {
            Ok(CoreInfo {
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                domain: row.try_get("domain")?,
            })
        })
        .transpose()
    }
}
