//! Demonstration data offered during first-run setup.

use sqlx::Row;
use tracing::info;

use crate::error::Result;
use crate::types::{CheckType, Service};
use crate::Database;

struct SampleService {
    name: &'static str,
    domain: &'static str,
    check_type: CheckType,
    method: &'static str,
    post_data: Option<&'static str>,
    expected: Option<&'static str>,
    expected_status: i64,
    check_interval_secs: i64,
    timeout_secs: i64,
    port: i64,
}

const SAMPLE_SERVICES: &[SampleService] = &[
    SampleService {
        name: "Google",
        domain: "https://google.com",
        check_type: CheckType::Http,
        method: "GET",
        post_data: None,
        expected: None,
        expected_status: 200,
        check_interval_secs: 10,
        timeout_secs: 10,
        port: 0,
    },
    SampleService {
        name: "Rust Homepage",
        domain: "https://www.rust-lang.org",
        check_type: CheckType::Http,
        method: "GET",
        post_data: None,
        expected: None,
        expected_status: 200,
        check_interval_secs: 30,
        timeout_secs: 20,
        port: 0,
    },
    SampleService {
        name: "JSON Users Test",
        domain: "https://jsonplaceholder.typicode.com/users",
        check_type: CheckType::Http,
        method: "GET",
        post_data: None,
        expected: Some("\"username\""),
        expected_status: 200,
        check_interval_secs: 60,
        timeout_secs: 30,
        port: 0,
    },
    SampleService {
        name: "JSON API Tester",
        domain: "https://jsonplaceholder.typicode.com/posts",
        check_type: CheckType::Http,
        method: "POST",
        post_data: Some(r#"{"title": "lookout", "body": "demo", "userId": 1}"#),
        expected: Some("\"id\""),
        expected_status: 201,
        check_interval_secs: 30,
        timeout_secs: 30,
        port: 0,
    },
    SampleService {
        name: "Google DNS",
        domain: "8.8.8.8",
        check_type: CheckType::Tcp,
        method: "",
        post_data: None,
        expected: None,
        expected_status: 0,
        check_interval_secs: 20,
        timeout_secs: 120,
        port: 53,
    },
];

/// Check results recorded per demo service: (latency ms, success, message).
const SAMPLE_CHECKS: &[(i64, bool, &str)] = &[
    (112, true, ""),
    (98, true, ""),
    (143, true, ""),
    (5000, false, "timeout awaiting response"),
    (87, true, ""),
];

impl Database {
    /// Insert the demo services and a short check history for each.
    ///
    /// Runs in one transaction: either every demo row lands or none does.
    pub async fn load_sample_data(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let now = Self::now_millis();

        for (order, svc) in SAMPLE_SERVICES.iter().enumerate() {
            sqlx::query(&self.kind.sql(
                r#"INSERT INTO services (name, domain, check_type, method, post_data, expected,
                    expected_status, check_interval_secs, timeout_secs, port, order_id, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            ))
            .bind(svc.name)
            .bind(svc.domain)
            .bind(svc.check_type.as_str())
            .bind(svc.method)
            .bind(svc.post_data)
            .bind(svc.expected)
            .bind(svc.expected_status)
            .bind(svc.check_interval_secs)
            .bind(svc.timeout_secs)
            .bind(svc.port)
            .bind(order as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let service_id: i64 =
                sqlx::query(&self.kind.sql("SELECT id FROM services WHERE name = ?"))
                    .bind(svc.name)
                    .fetch_one(&mut *tx)
                    .await?
                    .try_get("id")?;

            for (i, (latency_ms, success, message)) in SAMPLE_CHECKS.iter().enumerate() {
                let at = now - (SAMPLE_CHECKS.len() - i) as i64 * svc.check_interval_secs * 1000;
                sqlx::query(&self.kind.sql(
                    "INSERT INTO checks (service_id, latency_ms, success, message, created_at) VALUES (?, ?, ?, ?, ?)",
                ))
                .bind(service_id)
                .bind(*latency_ms)
                .bind(i64::from(*success))
                .bind(*message)
                .bind(at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        info!(services = SAMPLE_SERVICES.len(), "Loaded sample data");
        Ok(())
    }

    /// All services in display order.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            r#"SELECT id, name, domain, check_type, method, expected_status,
                      check_interval_secs, timeout_secs, port
               FROM services ORDER BY order_id, id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Service> {
                Ok(Service {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    domain: row.try_get("domain")?,
                    check_type: row.try_get("check_type")?,
                    method: row.try_get("method")?,
                    expected_status: row.try_get("expected_status")?,
                    check_interval_secs: row.try_get("check_interval_secs")?,
                    timeout_secs: row.try_get("timeout_secs")?,
                    port: row.try_get("port")?,
                })
            })
            .collect()
    }

    /// Number of recorded check results.
    pub async fn count_checks(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM checks")
            .fetch_one(&self.pool)
            .await?
            .try_get("n")?;
        Ok(count)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::{connect, ConnectionSettings, DbKind};

    #[tokio::test]
    async fn test_sample_data_is_all_or_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let settings = ConnectionSettings {
            kind: DbKind::Sqlite,
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            port: 0,
            location: tmp.path().to_path_buf(),
        };
        let db = connect(&settings, false).await.unwrap();

        db.load_sample_data().await.unwrap();
        let services = db.list_services().await.unwrap();
        assert_eq!(services.len(), SAMPLE_SERVICES.len());
        assert_eq!(services[0].name, "Google");
        assert_eq!(
            db.count_checks().await.unwrap(),
            (SAMPLE_SERVICES.len() * SAMPLE_CHECKS.len()) as i64
        );

        // Service names are unique, so a second load fails and rolls back.
        assert!(db.load_sample_data().await.is_err());
        assert_eq!(db.list_services().await.unwrap().len(), SAMPLE_SERVICES.len());

        db.close().await;
    }
}
