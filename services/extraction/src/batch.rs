//! Batch ingestion.
//!
//! Sequential loop over uploaded files. Each file is independently
//! extracted and handed to the persist callback; one file's failure is
//! recorded in its own outcome and never aborts or rolls back siblings.

use std::future::Future;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use specsheet_models::{DatasheetExtraction, DatasheetRecord};
use specsheet_utils::SpecsheetResult;

use crate::pdf_reader::file_fingerprint;
use crate::pipeline::IntegratedExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Completed,
    Failed,
    /// Identical bytes were ingested before; nothing new to store.
    Skipped,
}

/// What the persist callback did with a successfully extracted file.
pub enum PersistOutcome {
    Stored(Uuid),
    Duplicate(Uuid),
}

/// Per-file result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub file_hash: String,
    pub status: FileStatus,
    pub datasheet_id: Option<Uuid>,
    pub error: Option<String>,
    pub parameters: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.completed as f64 / self.outcomes.len() as f64
    }
}

/// Processes files one at a time. The persist callback receives the built
/// record and its extraction; returning `PersistenceConflict` (or any
/// error) fails only that file.
pub async fn process_batch<F, Fut>(
    extractor: &IntegratedExtractor,
    files: Vec<(String, Vec<u8>)>,
    mut persist: F,
) -> BatchSummary
where
    F: FnMut(DatasheetRecord, DatasheetExtraction) -> Fut,
    Fut: Future<Output = SpecsheetResult<PersistOutcome>>,
{
    let mut summary = BatchSummary::default();

    for (file_name, data) in files {
        let outcome = process_file(extractor, &file_name, &data, &mut persist).await;
        match outcome.status {
            FileStatus::Completed => summary.completed += 1,
            FileStatus::Failed => summary.failed += 1,
            FileStatus::Skipped => summary.skipped += 1,
        }
        summary.outcomes.push(outcome);
    }

    info!(
        total = summary.outcomes.len(),
        completed = summary.completed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Batch completed"
    );

    summary
}

async fn process_file<F, Fut>(
    extractor: &IntegratedExtractor,
    file_name: &str,
    data: &[u8],
    persist: &mut F,
) -> FileOutcome
where
    F: FnMut(DatasheetRecord, DatasheetExtraction) -> Fut,
    Fut: Future<Output = SpecsheetResult<PersistOutcome>>,
{
    let started = Instant::now();
    let file_hash = file_fingerprint(data);

    let (extraction, _stats) = match extractor.extract(data, file_name).await {
        Ok(result) => result,
        Err(e) => {
            warn!(file = file_name, error = %e, "File failed extraction");
            return FileOutcome {
                file_name: file_name.to_string(),
                file_hash,
                status: FileStatus::Failed,
                datasheet_id: None,
                error: Some(e.to_string()),
                parameters: 0,
                duration_ms: started.elapsed().as_millis() as u64,
            };
        }
    };

    let parameters = extraction.parameter_count();
    let extracted_data = match serde_json::to_value(&extraction) {
        Ok(value) => value,
        Err(_) => serde_json::Value::Null,
    };
    let record = DatasheetRecord::new(
        extraction.supplier.clone(),
        extraction.product_family.clone(),
        file_name,
        file_hash.clone(),
        extracted_data,
    );

    match persist(record, extraction).await {
        Ok(PersistOutcome::Stored(id)) => FileOutcome {
            file_name: file_name.to_string(),
            file_hash,
            status: FileStatus::Completed,
            datasheet_id: Some(id),
            error: None,
            parameters,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Ok(PersistOutcome::Duplicate(id)) => FileOutcome {
            file_name: file_name.to_string(),
            file_hash,
            status: FileStatus::Skipped,
            datasheet_id: Some(id),
            error: None,
            parameters,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        Err(e) => {
            warn!(file = file_name, error = %e, "File failed persistence");
            FileOutcome {
                file_name: file_name.to_string(),
                file_hash,
                status: FileStatus::Failed,
                datasheet_id: None,
                error: Some(e.to_string()),
                parameters,
                duration_ms: started.elapsed().as_millis() as u64,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsheet_utils::{ExtractionConfig, SpecsheetError};

    fn extractor() -> IntegratedExtractor {
        IntegratedExtractor::new(
            None,
            ExtractionConfig {
                high_confidence_threshold: 0.8,
                min_pattern_confidence: 0.6,
                min_parameters_threshold: 3,
                max_text_chars: 15_000,
            },
        )
    }

    #[tokio::test]
    async fn test_unreadable_files_fail_independently() {
        let files = vec![
            ("first.pdf".to_string(), b"not a pdf".to_vec()),
            ("second.pdf".to_string(), b"also not a pdf".to_vec()),
        ];

        let summary = process_batch(&extractor(), files, |_, _| async {
            panic!("persist must not be called for unreadable files")
        })
        .await;

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.completed, 0);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.status == FileStatus::Failed && o.error.is_some()));
        assert_eq!(summary.success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_failed_outcome_names_the_reason() {
        let files = vec![("broken.pdf".to_string(), b"garbage".to_vec())];

        let summary = process_batch(&extractor(), files, |_, _| async {
            Err::<PersistOutcome, SpecsheetError>(SpecsheetError::persistence_conflict(
                "TC-GDT-001",
            ))
        })
        .await;

        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.status, FileStatus::Failed);
        assert_eq!(outcome.file_name, "broken.pdf");
        assert!(outcome.error.is_some());
        assert_eq!(outcome.file_hash.len(), 64);
    }

    #[test]
    fn test_success_rate() {
        let outcome = |status| FileOutcome {
            file_name: "f.pdf".to_string(),
            file_hash: String::new(),
            status,
            datasheet_id: None,
            error: None,
            parameters: 0,
            duration_ms: 0,
        };
        let summary = BatchSummary {
            outcomes: vec![
                outcome(FileStatus::Completed),
                outcome(FileStatus::Completed),
                outcome(FileStatus::Failed),
                outcome(FileStatus::Skipped),
            ],
            completed: 2,
            failed: 1,
            skipped: 1,
        };
        assert!((summary.success_rate() - 0.5).abs() < 1e-9);
    }
}
