//! Datasheet Repository
//!
//! Persists reconciled extraction results. Each datasheet commits in one
//! transaction: the record, its part variants, and their parameters all
//! become visible together or not at all. Parameters are never updated in
//! place; re-extraction inserts a fresh datasheet record.
//!
//! Uses runtime SQL queries (unchecked) to avoid requiring DATABASE_URL at
//! compile time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use specsheet_models::{DatasheetExtraction, DatasheetRecord, ProcessingStatus};
use specsheet_utils::{SpecsheetError, SpecsheetResult};

pub struct DatasheetRepository {
    pool: PgPool,
}

impl DatasheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically inserts a datasheet record with all of its part variants
    /// and parameters. A duplicate part number (same datasheet or same
    /// supplier) rolls the whole datasheet back and surfaces as
    /// `PersistenceConflict`; previously committed records stay queryable.
    pub async fn insert_extraction(
        &self,
        record: &DatasheetRecord,
        extraction: &DatasheetExtraction,
    ) -> SpecsheetResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO datasheets
                (id, supplier, product_family, file_name, file_hash,
                 upload_date, extracted_data, processing_status, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.supplier)
        .bind(&record.product_family)
        .bind(&record.file_name)
        .bind(&record.file_hash)
        .bind(record.upload_date)
        .bind(&record.extracted_data)
        .bind(record.processing_status.as_str())
        .bind(&record.error_message)
        .execute(&mut *tx)
        .await?;

        for variant in &extraction.variants {
            let part_id = Uuid::new_v4();

            let inserted = sqlx::query(
                r#"
                INSERT INTO parts (id, datasheet_id, part_number, supplier, description)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(part_id)
            .bind(record.id)
            .bind(&variant.part_number)
            .bind(&record.supplier)
            .bind(&variant.description)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                if is_unique_violation(&e) {
                    // Dropping the transaction rolls back the datasheet.
                    return Err(SpecsheetError::persistence_conflict(
                        variant.part_number.clone(),
                    ));
                }
                return Err(e.into());
            }

            for param in &variant.parameters {
                sqlx::query(
                    r#"
                    INSERT INTO parameters (part_id, name, value, unit, category, confidence, source)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(part_id)
                .bind(param.kind.name())
                .bind(param.value.to_string())
                .bind(&param.unit)
                .bind(param.category.as_str())
                .bind(param.confidence)
                .bind(param.source.as_str())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            datasheet_id = %record.id,
            supplier = %record.supplier,
            variants = extraction.variants.len(),
            parameters = extraction.parameter_count(),
            "Datasheet persisted"
        );

        Ok(record.id)
    }

    /// Records a failed ingestion so the file and its reason stay visible.
    pub async fn record_failure(&self, record: &DatasheetRecord) -> SpecsheetResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO datasheets
                (id, supplier, product_family, file_name, file_hash,
                 upload_date, extracted_data, processing_status, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.supplier)
        .bind(&record.product_family)
        .bind(&record.file_name)
        .bind(&record.file_hash)
        .bind(record.upload_date)
        .bind(&record.extracted_data)
        .bind(record.processing_status.as_str())
        .bind(&record.error_message)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    /// Find datasheet by ID
    pub async fn find_by_id(&self, id: Uuid) -> SpecsheetResult<Option<DatasheetRecord>> {
        let row: Option<DatasheetRow> = sqlx::query_as(
            r#"
            SELECT id, supplier, product_family, file_name, file_hash,
                   upload_date, extracted_data, processing_status, error_message
            FROM datasheets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    /// All datasheets, newest upload first.
    pub async fn find_all(&self) -> SpecsheetResult<Vec<DatasheetRecord>> {
        let rows: Vec<DatasheetRow> = sqlx::query_as(
            r#"
            SELECT id, supplier, product_family, file_name, file_hash,
                   upload_date, extracted_data, processing_status, error_message
            FROM datasheets
            ORDER BY upload_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Duplicate-upload check: id of any datasheet with these exact bytes.
    pub async fn find_by_hash(&self, file_hash: &str) -> SpecsheetResult<Option<Uuid>> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM datasheets WHERE file_hash = $1 LIMIT 1")
                .bind(file_hash)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.0))
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct DatasheetRow {
    id: Uuid,
    supplier: String,
    product_family: String,
    file_name: String,
    file_hash: String,
    upload_date: DateTime<Utc>,
    extracted_data: Option<serde_json::Value>,
    processing_status: String,
    error_message: Option<String>,
}

impl From<DatasheetRow> for DatasheetRecord {
    fn from(row: DatasheetRow) -> Self {
        Self {
            id: row.id,
            supplier: row.supplier,
            product_family: row.product_family,
            file_name: row.file_name,
            file_hash: row.file_hash,
            upload_date: row.upload_date,
            extracted_data: row.extracted_data.unwrap_or(serde_json::Value::Null),
            processing_status: ProcessingStatus::parse(&row.processing_status),
            error_message: row.error_message,
        }
    }
}
