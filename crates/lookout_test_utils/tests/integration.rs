//! Setup storage against real PostgreSQL and MySQL servers.
//!
//! Run with:
//!   docker compose -f crates/lookout_test_utils/docker/docker-compose.yml up -d
//!   cargo test -p lookout_test_utils --features docker-tests

#![cfg(feature = "docker-tests")]

use lookout_db::{connect, CoreInfo, DbError, NewUser};
use lookout_test_utils::{ensure_container_running, DbVersion, TestDbConfig};

async fn provision_fresh_database(version: DbVersion) {
    ensure_container_running(version).await.unwrap();
    let location = std::env::temp_dir();
    let settings = TestDbConfig::new(version)
        .with_unique_database()
        .settings(&location);

    // Strict mode must not create the database.
    assert!(connect(&settings, true).await.is_err());

    let db = connect(&settings, false).await.unwrap();
    let admin = db
        .create_user(&NewUser::admin("admin", "hunter2", "ops@example.com"))
        .await
        .unwrap();
    assert!(admin.admin);
    assert!(matches!(
        db.create_user(&NewUser::admin("admin", "other", "")).await,
        Err(DbError::Constraint(_))
    ));

    db.save_core(&CoreInfo {
        name: "Acme".to_string(),
        description: String::new(),
        domain: "status.acme.test".to_string(),
    })
    .await
    .unwrap();
    db.load_sample_data().await.unwrap();
    assert_eq!(db.list_services().await.unwrap().len(), 5);
    db.close().await;

    let reopened = connect(&settings, true).await.unwrap();
    assert_eq!(reopened.count_users().await.unwrap(), 1);
    assert_eq!(reopened.core().await.unwrap().unwrap().name, "Acme");
    reopened.close().await;
}

#[tokio::test]
async fn test_postgres16_provisioning() {
    provision_fresh_database(DbVersion::Postgres16).await;
}

#[tokio::test]
async fn test_mysql8_provisioning() {
    provision_fresh_database(DbVersion::Mysql8).await;
}
