pub mod datasheet;
pub mod parameter;
pub mod query_log;

pub use datasheet::DatasheetRepository;
pub use parameter::{ComparisonRow, ParameterRepository, ParameterSummary, StoreMetrics};
pub use query_log::QueryRepository;
