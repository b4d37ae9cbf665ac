use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SpecsheetError {
    #[error("Unreadable PDF: {message}")]
    UnreadablePdf { message: String },

    #[error("AI call failed: {message}")]
    AiCallFailed { message: String },

    #[error("Malformed AI response: {message}")]
    MalformedAiResponse { message: String },

    #[error("Persistence conflict: part number {part_number} already exists")]
    PersistenceConflict { part_number: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SpecsheetError {
    pub fn unreadable_pdf(message: impl Into<String>) -> Self {
        Self::UnreadablePdf {
            message: message.into(),
        }
    }

    pub fn ai_call_failed(message: impl Into<String>) -> Self {
        Self::AiCallFailed {
            message: message.into(),
        }
    }

    pub fn malformed_ai_response(message: impl Into<String>) -> Self {
        Self::MalformedAiResponse {
            message: message.into(),
        }
    }

    pub fn persistence_conflict(part_number: impl Into<String>) -> Self {
        Self::PersistenceConflict {
            part_number: part_number.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnreadablePdf { .. } => "UNREADABLE_PDF",
            Self::AiCallFailed { .. } => "AI_CALL_FAILED",
            Self::MalformedAiResponse { .. } => "MALFORMED_AI_RESPONSE",
            Self::PersistenceConflict { .. } => "PERSISTENCE_CONFLICT",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnreadablePdf { .. } => 422,
            Self::AiCallFailed { .. } => 502,
            Self::MalformedAiResponse { .. } => 502,
            Self::PersistenceConflict { .. } => 409,
            Self::Database { .. } => 500,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// Transient failures are worth retrying; everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AiCallFailed { .. })
    }
}

pub type SpecsheetResult<T> = Result<T, SpecsheetError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl From<SpecsheetError> for ErrorResponse {
    fn from(error: SpecsheetError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

// Conversion from common error types

impl From<sqlx::Error> for SpecsheetError {
    fn from(error: sqlx::Error) -> Self {
        // Unique-constraint violations surface as persistence conflicts so
        // callers can reject the conflicting record instead of failing hard.
        if let sqlx::Error::Database(db) = &error {
            if db.code().as_deref() == Some("23505") {
                return Self::persistence_conflict(db.message().to_string());
            }
        }
        Self::database(error.to_string())
    }
}

impl From<reqwest::Error> for SpecsheetError {
    fn from(error: reqwest::Error) -> Self {
        Self::ai_call_failed(error.to_string())
    }
}

impl From<serde_json::Error> for SpecsheetError {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed_ai_response(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SpecsheetError::persistence_conflict("FTLX8571D3BCL").http_status_code(),
            409
        );
        assert_eq!(SpecsheetError::unreadable_pdf("x").http_status_code(), 422);
        assert_eq!(SpecsheetError::ai_call_failed("x").http_status_code(), 502);
    }

    #[test]
    fn test_only_ai_failures_are_transient() {
        assert!(SpecsheetError::ai_call_failed("timeout").is_transient());
        assert!(!SpecsheetError::malformed_ai_response("bad json").is_transient());
        assert!(!SpecsheetError::database("down").is_transient());
    }
}
