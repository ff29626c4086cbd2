use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::{conflict_message, Document, DocumentStore, Filter, StoreError, UNIQUE_FIELDS};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            body: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Documents stored in the `documents` JSONB table, one row per document.
pub struct PgDocumentStore {
    pool: PgPool,
    service_name: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, service_name: impl Into<String>) -> Self {
        Self {
            pool,
            service_name: service_name.into(),
        }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let field = UNIQUE_FIELDS
                    .iter()
                    .find(|(c, _)| *c == collection)
                    .map(|(_, f)| *f)
                    .unwrap_or("key");
                StoreError::Conflict(conflict_message(collection, field))
            }
            _ => StoreError::Database(err),
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let row: DocumentRow = sqlx::query_as(
            r#"
            INSERT INTO documents (id, collection, body)
            VALUES ($1, $2, $3)
            RETURNING id, body, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection)
        .bind(Json(body))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(collection, e))?;

        debug!(collection, id = %row.id, "Document inserted");
        Ok(row.into())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, body, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, body, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(collection)
        .bind(Json(Value::Object(filter)))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            UPDATE documents
            SET body = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING id, body, created_at, updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(body))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(collection, e))?;

        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, collection: &str, filter: Filter) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND body @> $2")
            .bind(collection)
            .bind(Json(Value::Object(filter)))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = db_pool::acquire_with_metrics(&self.pool, &self.service_name).await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
