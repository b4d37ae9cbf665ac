//! Query Log Repository
//!
//! Append-only audit trail of natural-language questions and their answers.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use specsheet_models::QueryRecord;
use specsheet_utils::SpecsheetResult;

pub struct QueryRepository {
    pool: PgPool,
}

impl QueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &QueryRecord) -> SpecsheetResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO queries (id, question, answer, intent, query_date, execution_time_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.question)
        .bind(&record.answer)
        .bind(&record.intent)
        .bind(record.query_date)
        .bind(record.execution_time_ms as i64)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    /// Most recent queries, newest first.
    pub async fn recent(&self, limit: i64) -> SpecsheetResult<Vec<QueryRecord>> {
        let rows: Vec<QueryRow> = sqlx::query_as(
            r#"
            SELECT id, question, answer, intent, query_date, execution_time_ms
            FROM queries
            ORDER BY query_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

#[derive(Debug, FromRow)]
struct QueryRow {
    id: Uuid,
    question: String,
    answer: String,
    intent: String,
    query_date: DateTime<Utc>,
    execution_time_ms: i64,
}

impl From<QueryRow> for QueryRecord {
    fn from(row: QueryRow) -> Self {
        Self {
            id: row.id,
            question: row.question,
            answer: row.answer,
            intent: row.intent,
            query_date: row.query_date,
            execution_time_ms: row.execution_time_ms.max(0) as u64,
        }
    }
}
