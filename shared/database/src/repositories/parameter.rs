//! Parameter Repository
//!
//! Read-side queries across all persisted parameters: the cross-supplier
//! comparison view, catalog lookups, and store-wide metrics.

use sqlx::{FromRow, PgPool};
use serde::Serialize;

use specsheet_models::ParameterKind;
use specsheet_utils::SpecsheetResult;

pub struct ParameterRepository {
    pool: PgPool,
}

/// One row of a cross-supplier comparison for a single parameter.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComparisonRow {
    pub supplier: String,
    pub part_number: String,
    pub value: String,
    pub unit: String,
    pub confidence: f64,
}

/// One vocabulary entry with how many stored values carry it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParameterSummary {
    pub name: String,
    pub category: String,
    pub count: i64,
}

/// Store-wide counts for the metrics endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreMetrics {
    pub datasheets: i64,
    pub parts: i64,
    pub parameters: i64,
    pub suppliers: i64,
    pub queries: i64,
}

impl ParameterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All values of one parameter across every supplier and part. Ordered
    /// by insertion so repeated calls return rows in the same order.
    pub async fn comparison(&self, kind: &ParameterKind) -> SpecsheetResult<Vec<ComparisonRow>> {
        let rows: Vec<ComparisonRow> = sqlx::query_as(
            r#"
            SELECT d.supplier, p.part_number, m.value, m.unit, m.confidence
            FROM parameters m
            JOIN parts p ON m.part_id = p.id
            JOIN datasheets d ON p.datasheet_id = d.id
            WHERE m.name = $1
            ORDER BY m.id
            "#,
        )
        .bind(kind.name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The stored parameter vocabulary with per-name counts.
    pub async fn unique_parameters(&self) -> SpecsheetResult<Vec<ParameterSummary>> {
        let rows: Vec<ParameterSummary> = sqlx::query_as(
            r#"
            SELECT name, MIN(category) AS category, COUNT(*) AS count
            FROM parameters
            GROUP BY name
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct suppliers with at least one datasheet.
    pub async fn suppliers(&self) -> SpecsheetResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT supplier FROM datasheets ORDER BY supplier")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn metrics(&self) -> SpecsheetResult<StoreMetrics> {
        let row: MetricsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM datasheets) AS datasheets,
                (SELECT COUNT(*) FROM parts) AS parts,
                (SELECT COUNT(*) FROM parameters) AS parameters,
                (SELECT COUNT(DISTINCT supplier) FROM datasheets) AS suppliers,
                (SELECT COUNT(*) FROM queries) AS queries
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreMetrics {
            datasheets: row.datasheets,
            parts: row.parts,
            parameters: row.parameters,
            suppliers: row.suppliers,
            queries: row.queries,
        })
    }
}

#[derive(Debug, FromRow)]
struct MetricsRow {
    datasheets: i64,
    parts: i64,
    parameters: i64,
    suppliers: i64,
    queries: i64,
}
