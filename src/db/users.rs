//! Read access to the identity system's `"User"` table

use crate::db::{Database, UserRepository};
use crate::error::StoreError;
use crate::models::User;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use tracing::warn;

pub struct PostgresUserStore {
    db: Arc<Database>,
}

impl PostgresUserStore {
    /// Verify the `"User"` table exists on `db`.
    ///
    /// The table belongs to the identity system, so it is never created here.
    pub async fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        db.client()
            .await?
            .query_one(r#"SELECT 'public."User"'::regclass::text"#, &[])
            .await
            .map_err(|e| {
                warn!(error = %e, "User table check failed");
                if is_missing_table(e.code()) {
                    StoreError::MissingTable("User".to_string())
                } else {
                    StoreError::Query { action: "check User table", source: e }
                }
            })?;
        Ok(Self { db })
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Self::new(Arc::new(Database::connect(database_url).await?)).await
    }

    /// Column names of `table`, in ordinal order
    pub async fn columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let rows = self
            .db
            .client()
            .await?
            .query(
                "SELECT column_name::text FROM information_schema.columns
                 WHERE table_name = $1
                 ORDER BY ordinal_position",
                &[&table],
            )
            .await
            .map_err(StoreError::query("fetch table columns"))?;

        rows.iter()
            .map(|row| row.try_get(0).map_err(StoreError::query("decode column name")))
            .collect()
    }
}

#[async_trait]
impl UserRepository for PostgresUserStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = self
            .db
            .client()
            .await?
            .query_opt(
                r#"SELECT id, name, email, password, "emailVerified"::text, image
                   FROM "User"
                   WHERE id = $1"#,
                &[&id],
            )
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %id, "Failed to fetch user");
                StoreError::Query { action: "fetch user", source: e }
            })?;

        row.as_ref().map(user_from_row).transpose()
    }
}

/// Only `undefined_table` means the table is absent; anything else is a real failure
fn is_missing_table(code: Option<&SqlState>) -> bool {
    code == Some(&SqlState::UNDEFINED_TABLE)
}

fn user_from_row(row: &Row) -> Result<User, StoreError> {
    decode_user(row).map_err(StoreError::query("decode user row"))
}

fn decode_user(row: &Row) -> Result<User, tokio_postgres::Error> {
    let text = |idx: usize| row.try_get::<_, Option<String>>(idx);

    Ok(User {
        id: row.try_get(0)?,
        name: text(1)?.unwrap_or_default(),
        email: text(2)?.unwrap_or_default(),
        password: text(3)?.unwrap_or_default(),
        email_verified: text(4)?,
        image: text(5)?,
    })
}
