//! Natural-language query audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answered question, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    /// Classified intent label ("highest", "lowest", "compare", "lookup").
    pub intent: String,
    pub query_date: DateTime<Utc>,
    pub execution_time_ms: u64,
}

impl QueryRecord {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        intent: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            intent: intent.into(),
            query_date: Utc::now(),
            execution_time_ms,
        }
    }
}
