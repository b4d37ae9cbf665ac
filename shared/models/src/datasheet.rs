//! Datasheet and part variant records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing state of an ingested datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processing,
    Complete,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "failed" => Self::Failed,
            _ => Self::Complete,
        }
    }
}

/// One ingested supplier datasheet. Immutable after persistence;
/// re-extraction inserts a new record rather than mutating history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasheetRecord {
    pub id: Uuid,
    pub supplier: String,
    pub product_family: String,
    pub file_name: String,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub file_hash: String,
    pub upload_date: DateTime<Utc>,
    /// Raw reconciled extraction payload, kept for audit and re-display.
    pub extracted_data: serde_json::Value,
    pub processing_status: ProcessingStatus,
    pub error_message: Option<String>,
}

impl DatasheetRecord {
    pub fn new(
        supplier: impl Into<String>,
        product_family: impl Into<String>,
        file_name: impl Into<String>,
        file_hash: impl Into<String>,
        extracted_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            supplier: supplier.into(),
            product_family: product_family.into(),
            file_name: file_name.into(),
            file_hash: file_hash.into(),
            upload_date: Utc::now(),
            extracted_data,
            processing_status: ProcessingStatus::Complete,
            error_message: None,
        }
    }

    /// A failed-ingestion record: no variants, the reason preserved.
    pub fn failed(
        file_name: impl Into<String>,
        file_hash: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            supplier: "Unknown".to_string(),
            product_family: "Unknown".to_string(),
            file_name: file_name.into(),
            file_hash: file_hash.into(),
            upload_date: Utc::now(),
            extracted_data: serde_json::Value::Null,
            processing_status: ProcessingStatus::Failed,
            error_message: Some(error_message.into()),
        }
    }
}

/// One part number within a datasheet. Unique per (datasheet, part number)
/// and per (supplier, part number) across datasheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartVariant {
    pub id: Uuid,
    pub datasheet_id: Uuid,
    pub part_number: String,
    pub description: String,
}

impl PartVariant {
    pub fn new(datasheet_id: Uuid, part_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            datasheet_id,
            part_number: part_number.into(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_carries_reason() {
        let rec = DatasheetRecord::failed("broken.pdf", "abc123", "not a PDF");
        assert_eq!(rec.processing_status, ProcessingStatus::Failed);
        assert_eq!(rec.error_message.as_deref(), Some("not a PDF"));
        assert!(rec.extracted_data.is_null());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ProcessingStatus::Processing,
            ProcessingStatus::Complete,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(ProcessingStatus::parse(status.as_str()), status);
        }
    }
}
