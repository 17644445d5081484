//! Lookout
//!
//! Self-hosted uptime monitor. A fresh install starts unconfigured and serves
//! a one-time setup page; submitting it stores the installation record,
//! verifies the database, creates the administrator and flips the process to
//! initialized.

pub mod bootstrap;
pub mod config;
pub mod http;
pub mod session;
pub mod state;
pub mod view;

pub use bootstrap::{Bootstrap, BootstrapOptions, SetupError, SetupOutcome, SetupPage};
pub use config::{ConfigError, ConfigPersistence, ConfigRecord, ConfigStore, SetupForm};
pub use state::{BootstrapState, BootstrapStatus};
