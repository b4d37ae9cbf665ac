pub mod config;
pub mod error;
pub mod logging;
pub mod mistral;

pub use config::{AiConfig, AppConfig, DatabaseConfig, ExtractionConfig, LoggingConfig};
pub use error::{ErrorResponse, SpecsheetError, SpecsheetResult};
pub use logging::init_logging;
pub use mistral::{extract_json, MistralClient};
