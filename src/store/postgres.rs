use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, Pool, Postgres};

use super::{DocumentStore, StoreError};
use crate::records::Record;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct PgStore {
    pub pool: Pool<Postgres>,
}

#[derive(FromRow)]
struct RecordRow {
    kind: String,
    id: String,
    document: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            kind: row.kind,
            id: row.id,
            document: row.document.0,
            created_at: row.created_at,
        }
    }
}

impl PgStore {
    pub fn with_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn increment_counter(&self, name: &str) -> Result<i64, StoreError> {
        // one statement, so the row lock taken by ON CONFLICT serializes
        // concurrent callers and a failure leaves the row untouched
        let value: i64 = sqlx::query_scalar(
            r#"
                INSERT INTO counters (name, value)
                VALUES ($1, 1)
                ON CONFLICT (name) DO UPDATE SET value = counters.value + 1
                RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
                INSERT INTO records (kind, id, document, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (kind, id) DO NOTHING
            "#,
        )
        .bind(&record.kind)
        .bind(&record.id)
        .bind(Json(&record.document))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::Duplicate {
                kind: record.kind.clone(),
                id: record.id.clone(),
            });
        }

        Ok(())
    }

    async fn list_records(&self, kind: &str) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
                SELECT kind, id, document, created_at
                FROM records
                WHERE kind = $1
                ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn find_record(&self, kind: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
                SELECT kind, id, document, created_at
                FROM records
                WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Record::from))
    }
}
