//! Shared database layer: PostgreSQL pool, migrations, and repositories.

pub mod migrations;
pub mod postgres;
pub mod repositories;

pub use migrations::run_postgres_migrations;
pub use postgres::{create_postgres_pool, health_check, PostgresPool};
pub use repositories::{
    ComparisonRow, DatasheetRepository, ParameterRepository, ParameterSummary, QueryRepository,
    StoreMetrics,
};
