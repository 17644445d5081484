//! Lookout Test Utilities
//!
//! Docker-backed PostgreSQL and MySQL servers for exercising the setup flow
//! against real engines. SQLite needs none of this and is tested in place.
//!
//! # Features
//!
//! - `docker-tests`: Enable tests that require Docker containers
//!
//! # Usage
//!
//! ```rust,ignore
//! use lookout_test_utils::{ensure_container_running, DbVersion, TestDbConfig};
//!
//! #[tokio::test]
//! #[cfg(feature = "docker-tests")]
//! async fn test_against_postgres() {
//!     ensure_container_running(DbVersion::Postgres16).await.unwrap();
//!     let settings = TestDbConfig::new(DbVersion::Postgres16)
//!         .with_unique_database()
//!         .settings(tmp.path());
//!     let db = lookout_db::connect(&settings, false).await.unwrap();
//! }
//! ```

pub mod config;
pub mod containers;

pub use config::{DbVersion, TestDbConfig};
pub use containers::lifecycle::{ensure_container_running, wait_for_healthy};
