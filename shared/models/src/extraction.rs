//! Extraction pipeline result types.
//!
//! `FieldObservation` is the unit both extraction methods speak: every
//! recognized field is present in a method's output, explicitly `Absent`
//! when nothing matched, so downstream logic can tell "not found" from
//! "zero".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parameter::{Parameter, ParameterKind, ParameterValue};

/// Outcome of one extraction method for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FieldOutcome {
    Found {
        value: ParameterValue,
        unit: String,
        confidence: f64,
    },
    Absent,
}

impl FieldOutcome {
    pub fn found(value: ParameterValue, unit: impl Into<String>, confidence: f64) -> Self {
        Self::Found {
            value,
            unit: unit.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Found { confidence, .. } => *confidence,
            Self::Absent => 0.0,
        }
    }
}

/// One field's outcome from one extraction method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldObservation {
    pub kind: ParameterKind,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
}

impl FieldObservation {
    pub fn found(
        kind: ParameterKind,
        value: ParameterValue,
        unit: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            kind,
            outcome: FieldOutcome::found(value, unit, confidence),
        }
    }

    pub fn absent(kind: ParameterKind) -> Self {
        Self {
            kind,
            outcome: FieldOutcome::Absent,
        }
    }
}

/// Reconciled parameters for one part number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantExtraction {
    pub part_number: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

/// Provenance recorded alongside a reconciled extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub pattern_parameters: usize,
    pub ai_parameters: usize,
    pub merged: bool,
}

/// Complete reconciled extraction for one datasheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasheetExtraction {
    pub supplier: String,
    pub product_family: String,
    pub variants: Vec<VariantExtraction>,
    pub extraction_date: DateTime<Utc>,
    pub metadata: ExtractionMetadata,
}

impl DatasheetExtraction {
    pub fn parameter_count(&self) -> usize {
        self.variants.iter().map(|v| v.parameters.len()).sum()
    }

    pub fn average_confidence(&self) -> f64 {
        let count = self.parameter_count();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .variants
            .iter()
            .flat_map(|v| v.parameters.iter())
            .map(|p| p.confidence)
            .sum();
        sum / count as f64
    }
}

/// Timing and provenance statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_parameters: usize,
    pub pattern_extracted: usize,
    pub ai_extracted: usize,
    pub pattern_confidence_avg: f64,
    pub ai_confidence_avg: f64,
    pub execution_time_ms: u64,
    pub file_size: usize,
    pub text_chars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ExtractionSource, ParameterValue};

    #[test]
    fn test_absent_is_explicit_in_serialized_form() {
        let obs = FieldObservation::absent(ParameterKind::Reach);
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["kind"], "reach");
        assert_eq!(json["outcome"], "absent");
    }

    #[test]
    fn test_average_confidence() {
        let extraction = DatasheetExtraction {
            supplier: "Finisar".to_string(),
            product_family: "Optical Transceivers".to_string(),
            variants: vec![VariantExtraction {
                part_number: "FTLX8571D3BCL".to_string(),
                description: String::new(),
                parameters: vec![
                    Parameter::new(
                        ParameterKind::Wavelength,
                        ParameterValue::Numeric(850.0),
                        "nm",
                        0.9,
                        ExtractionSource::Pattern,
                    ),
                    Parameter::new(
                        ParameterKind::DataRate,
                        ParameterValue::Numeric(10.3125),
                        "Gbps",
                        0.7,
                        ExtractionSource::Ai,
                    ),
                ],
            }],
            extraction_date: Utc::now(),
            metadata: ExtractionMetadata::default(),
        };
        assert_eq!(extraction.parameter_count(), 2);
        assert!((extraction.average_confidence() - 0.8).abs() < 1e-9);
    }
}
