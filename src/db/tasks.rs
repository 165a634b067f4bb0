//! `tasks` table operations

use crate::db::{Database, TaskRepository};
use crate::error::StoreError;
use crate::models::{NewTask, Task, STATUS_RUNNING};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio_postgres::Row;
use tracing::{debug, warn};

const TASK_COLUMNS: &str =
    "id, user_id, stock, kline_type, buy_strategy, sell_strategy, status, timestamp";

pub struct PostgresTaskStore {
    db: Arc<Database>,
}

impl PostgresTaskStore {
    /// Create the `tasks` table on `db` if it does not exist yet
    pub async fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Self::new(Arc::new(Database::connect(database_url).await?)).await
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.db
            .client()
            .await?
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id serial PRIMARY KEY,
                    user_id varchar,
                    stock varchar,
                    kline_type varchar,
                    buy_strategy varchar,
                    sell_strategy varchar,
                    status varchar,
                    timestamp timestamp default current_timestamp
                )",
            )
            .await
            .map_err(StoreError::query("create task table"))?;
        debug!("tasks table ready");
        Ok(())
    }

    async fn query_tasks(
        &self,
        action: &'static str,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Task>, StoreError> {
        let client = self.db.client().await?;
        let rows = client.query(sql, params).await.map_err(|e| {
            warn!(error = %e, "Failed to {}", action);
            StoreError::Query { action, source: e }
        })?;
        rows.iter().map(task_from_row).collect()
    }

    async fn query_task(
        &self,
        action: &'static str,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Option<Task>, StoreError> {
        let client = self.db.client().await?;
        let row = client.query_opt(sql, params).await.map_err(|e| {
            warn!(error = %e, "Failed to {}", action);
            StoreError::Query { action, source: e }
        })?;
        row.as_ref().map(task_from_row).transpose()
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (user_id, stock, kline_type, buy_strategy, sell_strategy, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = self
            .db
            .client()
            .await?
            .query_one(
                &sql,
                &[
                    &task.user_id,
                    &task.stock,
                    &task.kline_type,
                    &task.buy_strategy,
                    &task.sell_strategy,
                    &task.status,
                ],
            )
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %task.user_id, "Failed to insert task");
                StoreError::Query { action: "insert task", source: e }
            })?;
        task_from_row(&row)
    }

    async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        self.query_tasks("fetch tasks", &sql, &[]).await
    }

    async fn get_by_user_and_id(
        &self,
        user_id: &str,
        id: i32,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND id = $2",
            TASK_COLUMNS
        );
        self.query_task("fetch task", &sql, &[&user_id, &id]).await
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        self.query_task("fetch task", &sql, &[&id]).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY id",
            TASK_COLUMNS
        );
        self.query_tasks("fetch user tasks", &sql, &[&user_id]).await
    }

    async fn list_running(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE status = $1 ORDER BY id",
            TASK_COLUMNS
        );
        self.query_tasks("fetch running tasks", &sql, &[&STATUS_RUNNING])
            .await
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.db
            .client()
            .await?
            .execute("DELETE FROM tasks", &[])
            .await
            .map_err(StoreError::query("delete tasks"))
    }

    async fn delete_by_user_and_id(&self, user_id: &str, id: i32) -> Result<u64, StoreError> {
        self.db
            .client()
            .await?
            .execute(
                "DELETE FROM tasks WHERE user_id = $1 AND id = $2",
                &[&user_id, &id],
            )
            .await
            .map_err(StoreError::query("delete task"))
    }

    async fn drop_table(&self) -> Result<(), StoreError> {
        self.db
            .client()
            .await?
            .batch_execute("DROP TABLE IF EXISTS tasks")
            .await
            .map_err(StoreError::query("drop task table"))
    }
}

fn task_from_row(row: &Row) -> Result<Task, StoreError> {
    let text = |idx: usize| -> Result<String, StoreError> {
        row.try_get::<_, Option<String>>(idx)
            .map(Option::unwrap_or_default)
            .map_err(StoreError::query("decode task row"))
    };

    Ok(Task {
        id: row
            .try_get(0)
            .map_err(StoreError::query("decode task row"))?,
        user_id: text(1)?,
        stock: text(2)?,
        kline_type: text(3)?,
        buy_strategy: text(4)?,
        sell_strategy: text(5)?,
        status: text(6)?,
        timestamp: row
            .try_get::<_, NaiveDateTime>(7)
            .map_err(StoreError::query("decode task row"))?,
    })
}
