//! Storage seams used by the setup workflow.
//!
//! The workflow only needs to open a connection and then provision through
//! it. Keeping both behind traits lets the workflow run against a real
//! engine in production and against scripted doubles in tests.

use std::sync::Arc;

use async_trait::async_trait;
use lookout_db::{ConnectionSettings, CoreInfo, Database, NewUser};

/// Opens a verified connection to the configured engine.
#[async_trait]
pub trait Connector: Send + Sync {
    /// `strict = false` tolerates (and creates) a missing database.
    async fn connect(
        &self,
        settings: &ConnectionSettings,
        strict: bool,
    ) -> lookout_db::Result<Arc<dyn LiveDatabase>>;
}

/// Operations available once a connection is live.
#[async_trait]
pub trait LiveDatabase: Send + Sync {
    /// Create the administrator; the password is hashed by the store.
    async fn create_admin(&self, admin: &NewUser) -> lookout_db::Result<()>;

    async fn save_core(&self, core: &CoreInfo) -> lookout_db::Result<()>;

    async fn load_sample_data(&self) -> lookout_db::Result<()>;

    async fn core(&self) -> lookout_db::Result<Option<CoreInfo>>;

    async fn service_count(&self) -> lookout_db::Result<usize>;
}

/// [`Connector`] backed by [`lookout_db::connect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlConnector;

#[async_trait]
impl Connector for SqlConnector {
    async fn connect(
        &self,
        settings: &ConnectionSettings,
        strict: bool,
    ) -> lookout_db::Result<Arc<dyn LiveDatabase>> {
        let db = lookout_db::connect(settings, strict).await?;
        Ok(Arc::new(db))
    }
}

#[async_trait]
impl LiveDatabase for Database {
    async fn create_admin(&self, admin: &NewUser) -> lookout_db::Result<()> {
        self.create_user(admin).await.map(|_| ())
    }

    async fn save_core(&self, core: &CoreInfo) -> lookout_db::Result<()> {
        Database::save_core(self, core).await
    }

    async fn load_sample_data(&self) -> lookout_db::Result<()> {
        Database::load_sample_data(self).await
    }

    async fn core(&self) -> lookout_db::Result<Option<CoreInfo>> {
        Database::core(self).await
    }

    async fn service_count(&self) -> lookout_db::Result<usize> {
        Ok(self.list_services().await?.len())
    }
}
