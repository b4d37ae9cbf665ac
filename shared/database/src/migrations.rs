use anyhow::Result;
use sqlx::PgPool;

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running PostgreSQL migrations");

    // Create datasheets table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasheets (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            supplier VARCHAR NOT NULL,
            product_family VARCHAR NOT NULL,
            file_name VARCHAR NOT NULL,
            file_hash VARCHAR NOT NULL,
            upload_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            extracted_data JSONB,
            processing_status VARCHAR NOT NULL DEFAULT 'complete',
            error_message TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create parts table. Supplier is denormalized onto the row so the
    // cross-datasheet uniqueness rule can live in the schema.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            datasheet_id UUID NOT NULL REFERENCES datasheets(id) ON DELETE CASCADE,
            part_number VARCHAR NOT NULL,
            supplier VARCHAR NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            UNIQUE (datasheet_id, part_number),
            UNIQUE (supplier, part_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create parameters table. BIGSERIAL key gives comparison views a
    // stable insertion order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parameters (
            id BIGSERIAL PRIMARY KEY,
            part_id UUID NOT NULL REFERENCES parts(id) ON DELETE CASCADE,
            name VARCHAR NOT NULL,
            value TEXT NOT NULL,
            unit VARCHAR NOT NULL DEFAULT '',
            category VARCHAR NOT NULL DEFAULT 'general',
            confidence DOUBLE PRECISION NOT NULL DEFAULT 1.0,
            source VARCHAR NOT NULL DEFAULT 'pattern',
            UNIQUE (part_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create queries table (append-only audit trail)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queries (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            intent VARCHAR NOT NULL,
            query_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            execution_time_ms BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parameters_name ON parameters(name)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parts_part_number ON parts(part_number)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_datasheets_supplier ON datasheets(supplier)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_datasheets_file_hash ON datasheets(file_hash)")
        .execute(pool)
        .await?;

    tracing::info!("PostgreSQL migrations completed successfully");
    Ok(())
}
