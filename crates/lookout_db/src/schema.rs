//! Schema creation for all Lookout tables.
//!
//! All CREATE TABLE statements live here. Column types are chosen so the
//! same statements work on every engine; only the auto-increment key differs.
//! Integers are stored as 64-bit everywhere so they decode uniformly through
//! the `Any` driver.

use crate::error::Result;
use crate::types::DbKind;
use crate::Database;
use tracing::info;

fn id_column(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Postgres => "id BIGSERIAL PRIMARY KEY",
        DbKind::Mysql => "id BIGINT AUTO_INCREMENT PRIMARY KEY",
        DbKind::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    }
}

impl Database {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        if self.kind == DbKind::Sqlite {
            sqlx::query("PRAGMA foreign_keys=ON")
                .execute(&self.pool)
                .await?;
        }

        self.create_account_tables().await?;
        self.create_monitor_tables().await?;

        info!(kind = %self.kind, "Database schema verified");
        Ok(())
    }

    /// Users and project metadata
    async fn create_account_tables(&self) -> Result<()> {
        let id = id_column(self.kind);

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS users (
                {id},
                username VARCHAR(255) NOT NULL UNIQUE,
                password VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                admin BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS core (
                {id},
                name VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                domain VARCHAR(255) NOT NULL,
                created_at BIGINT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Monitored services and their check results
    async fn create_monitor_tables(&self) -> Result<()> {
        let id = id_column(self.kind);

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS services (
                {id},
                name VARCHAR(255) NOT NULL UNIQUE,
                domain VARCHAR(255) NOT NULL,
                check_type VARCHAR(16) NOT NULL,
                method VARCHAR(16) NOT NULL DEFAULT '',
                post_data TEXT,
                expected TEXT,
                expected_status BIGINT NOT NULL DEFAULT 200,
                check_interval_secs BIGINT NOT NULL DEFAULT 60,
                timeout_secs BIGINT NOT NULL DEFAULT 15,
                port BIGINT NOT NULL DEFAULT 0,
                order_id BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS checks (
                {id},
                service_id BIGINT NOT NULL REFERENCES services(id),
                latency_ms BIGINT NOT NULL,
                success BIGINT NOT NULL,
                message VARCHAR(255) NOT NULL DEFAULT '',
                created_at BIGINT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
