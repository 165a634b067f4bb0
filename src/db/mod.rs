//! Postgres record stores for tasks and users

pub mod tasks;
pub mod users;

pub use tasks::PostgresTaskStore;
pub use users::PostgresUserStore;

use crate::core::http::HealthCheck;
use crate::error::StoreError;
use crate::models::{NewTask, Task, User};
use async_trait::async_trait;
use prometheus::Gauge;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info, warn};

/// CRUD access to the `tasks` table
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task and return the stored row, including `id` and `timestamp`
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn list_all(&self) -> Result<Vec<Task>, StoreError>;

    async fn get_by_user_and_id(&self, user_id: &str, id: i32)
        -> Result<Option<Task>, StoreError>;

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, StoreError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Tasks whose status is `running`
    async fn list_running(&self) -> Result<Vec<Task>, StoreError>;

    /// Returns the number of rows deleted
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Returns the number of rows deleted
    async fn delete_by_user_and_id(&self, user_id: &str, id: i32) -> Result<u64, StoreError>;

    async fn drop_table(&self) -> Result<(), StoreError>;
}

/// Read-only lookup of users owned by the identity system
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
}

/// Open a client and drive its connection on a background task
async fn open(database_url: &str) -> Result<Client, StoreError> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(StoreError::Connect)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "Postgres connection error");
        }
    });

    Ok(client)
}

/// Postgres client shared by the stores.
///
/// Once the server closes the connection the next caller reopens it, so a
/// database restart does not leave the worker failing every job.
pub struct Database {
    database_url: String,
    client: RwLock<Arc<Client>>,
    status: Option<Gauge>,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client = open(database_url).await?;
        Ok(Self {
            database_url: database_url.to_string(),
            client: RwLock::new(Arc::new(client)),
            status: None,
        })
    }

    /// Mirror the connection state into `gauge` (1 = connected)
    pub fn with_status_gauge(mut self, gauge: Gauge) -> Self {
        gauge.set(1.0);
        self.status = Some(gauge);
        self
    }

    /// A live client, reconnecting first if the current one is closed
    pub async fn client(&self) -> Result<Arc<Client>, StoreError> {
        {
            let client = self.client.read().await;
            if !client.is_closed() {
                return Ok(client.clone());
            }
        }

        let mut client = self.client.write().await;
        // Another caller may have reconnected while we waited for the lock
        if !client.is_closed() {
            return Ok(client.clone());
        }

        warn!("Postgres connection closed, reconnecting");
        match open(&self.database_url).await {
            Ok(fresh) => {
                *client = Arc::new(fresh);
                self.set_status(1.0);
                info!("Postgres reconnected");
                Ok(client.clone())
            }
            Err(e) => {
                self.set_status(0.0);
                warn!(error = %e, "Postgres reconnect failed");
                Err(e)
            }
        }
    }

    fn set_status(&self, value: f64) {
        if let Some(gauge) = &self.status {
            gauge.set(value);
        }
    }
}

#[async_trait]
impl HealthCheck for Database {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn is_healthy(&self) -> bool {
        self.client().await.is_ok()
    }
}
