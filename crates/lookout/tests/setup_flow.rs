//! End-to-end setup through the router against SQLite.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lookout::bootstrap::{Bootstrap, BootstrapOptions, SqlConnector};
use lookout::config::{ConfigPersistence, ConfigStore};
use lookout::http::router;
use lookout::BootstrapStatus;
use lookout_db::{connect, ConnectionSettings, DbKind};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(tmp: &TempDir) -> (Arc<Bootstrap>, Router) {
    let store = Arc::new(ConfigStore::new(tmp.path()));
    let options = BootstrapOptions::new(tmp.path()).with_settle_delay(Duration::ZERO);
    let bootstrap = Arc::new(Bootstrap::new(store, Arc::new(SqlConnector), options));
    (bootstrap.clone(), router(bootstrap))
}

fn post_setup(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/setup")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_root_redirects_to_setup_before_configuration() {
    let tmp = TempDir::new().unwrap();
    let (_, router) = app(&tmp);

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/setup");
}

#[tokio::test]
async fn test_sqlite_setup_completes() {
    let tmp = TempDir::new().unwrap();
    let (bootstrap, router) = app(&tmp);

    let form = "db_connection=sqlite&project=Acme+Status&description=Public+status\
                &domain=status.acme.test&username=admin&password=hunter2\
                &email=ops%40acme.test&sample_data=on";
    let response = router.clone().oneshot(post_setup(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("lookout_session=;"));
    assert!(cookie.contains("Max-Age=0"));

    assert_eq!(bootstrap.state().status(), BootstrapStatus::Initialized);
    assert_eq!(bootstrap.sessions().generation(), 1);

    let store = ConfigStore::new(tmp.path());
    let record = store.load().unwrap();
    assert_eq!(record.connection, "sqlite");
    assert_eq!(record.username, "admin");
    assert!(record.admin_password.is_empty());
    let on_disk = std::fs::read_to_string(store.path()).unwrap();
    assert!(!on_disk.contains("hunter2"));

    let settings = ConnectionSettings {
        kind: DbKind::Sqlite,
        host: String::new(),
        user: String::new(),
        password: String::new(),
        database: String::new(),
        port: 0,
        location: tmp.path().to_path_buf(),
    };
    let db = connect(&settings, true).await.unwrap();
    let admin = db.find_user("admin").await.unwrap().unwrap();
    assert!(admin.admin);
    assert_eq!(admin.email, "ops@acme.test");
    assert_eq!(db.list_services().await.unwrap().len(), 5);
    assert_eq!(db.core().await.unwrap().unwrap().name, "Acme Status");
    db.close().await;

    // Setup is one-shot from here on.
    let again = router.clone().oneshot(get("/setup")).await.unwrap();
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert_eq!(again.headers()[header::LOCATION], "/");

    let resubmit = router.clone().oneshot(post_setup(form)).await.unwrap();
    assert_eq!(resubmit.status(), StatusCode::SEE_OTHER);
    assert_eq!(bootstrap.sessions().generation(), 1);

    let landing = router.oneshot(get("/")).await.unwrap();
    assert_eq!(landing.status(), StatusCode::OK);
    let html = body_text(landing).await;
    assert!(html.contains("<h1>Acme Status</h1>"));
    assert!(html.contains("5 services monitored"));
}

#[tokio::test]
async fn test_sqlite_setup_without_sample_data() {
    let tmp = TempDir::new().unwrap();
    let (bootstrap, router) = app(&tmp);

    let form = "db_connection=sqlite&project=Quiet&username=root&password=pw";
    let response = router.oneshot(post_setup(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let db = bootstrap.database().unwrap();
    assert_eq!(db.service_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_database_shows_form_again() {
    let tmp = TempDir::new().unwrap();
    let (bootstrap, router) = app(&tmp);

    let form = "db_connection=postgres&db_host=127.0.0.1&db_port=1&db_user=lookout\
                &db_password=nope&db_database=lookout&project=Acme&username=admin&password=pw";
    let response = router.oneshot(post_setup(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("value=\"127.0.0.1\""));
    assert!(!html.contains("nope"));

    assert!(!ConfigStore::new(tmp.path()).exists());
    assert_eq!(bootstrap.state().status(), BootstrapStatus::Unconfigured);
}

#[tokio::test]
async fn test_restart_resumes_existing_configuration() {
    let tmp = TempDir::new().unwrap();
    {
        let (_, router) = app(&tmp);
        let form = "db_connection=sqlite&project=Acme&username=admin&password=pw";
        let response = router.oneshot(post_setup(form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let (bootstrap, router) = app(&tmp);
    assert!(!bootstrap.is_initialized());
    assert!(bootstrap.resume().await.unwrap());

    let response = router.oneshot(get("/setup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_repeated_form_field_uses_first_value() {
    let tmp = TempDir::new().unwrap();
    let (bootstrap, router) = app(&tmp);

    let form = "db_connection=sqlite&project=Acme&username=admin&password=pw\
                &sample_data=on&sample_data=off&username=second";
    let response = router.oneshot(post_setup(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let db = bootstrap.database().unwrap();
    assert_eq!(db.service_count().await.unwrap(), 5);
    assert_eq!(ConfigStore::new(tmp.path()).load().unwrap().username, "admin");
}
