#![cfg(feature = "sqlite")]

use lookout_db::{connect, verify_password, ConnectionSettings, DbError, DbKind, NewUser};
use tempfile::TempDir;

fn settings(dir: &TempDir) -> ConnectionSettings {
    ConnectionSettings {
        kind: DbKind::Sqlite,
        host: String::new(),
        user: String::new(),
        password: String::new(),
        database: "ignored".to_string(),
        port: 0,
        location: dir.path().join("state"),
    }
}

#[tokio::test]
async fn test_admin_password_is_hashed() {
    let tmp = TempDir::new().unwrap();
    let db = connect(&settings(&tmp), false).await.unwrap();

    let created = db
        .create_user(&NewUser::admin("admin", "hunter22", "ops@example.com"))
        .await
        .unwrap();
    assert!(created.admin);
    assert_eq!(created.email, "ops@example.com");
    assert_ne!(created.password_hash, "hunter22");
    assert!(verify_password(&created.password_hash, "hunter22"));

    let found = db.find_user("admin").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    db.close().await;
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let db = connect(&settings(&tmp), false).await.unwrap();

    db.create_user(&NewUser::admin("admin", "one", ""))
        .await
        .unwrap();
    let err = db
        .create_user(&NewUser::admin("admin", "two", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Constraint(_)));
    assert_eq!(db.count_users().await.unwrap(), 1);
    db.close().await;
}

#[tokio::test]
async fn test_empty_username_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let db = connect(&settings(&tmp), false).await.unwrap();

    let err = db
        .create_user(&NewUser::admin("   ", "pw", ""))
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(db.count_users().await.unwrap(), 0);
    db.close().await;
}

#[tokio::test]
async fn test_reconnect_keeps_accounts() {
    let tmp = TempDir::new().unwrap();
    let s = settings(&tmp);

    let db = connect(&s, false).await.unwrap();
    db.create_user(&NewUser::admin("admin", "pw", ""))
        .await
        .unwrap();
    db.close().await;

    let db = connect(&s, true).await.unwrap();
    assert!(db.find_user("admin").await.unwrap().is_some());
    db.close().await;
}
