//! Integrated extraction pipeline.
//!
//! Linear pass over one datasheet: acquire text, run the pattern rules,
//! decide whether the AI fallback is worth consulting, reconcile, and
//! shape the result for persistence. AI failures degrade to pattern-only
//! results; only an unreadable PDF fails the file.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use specsheet_models::{
    DatasheetExtraction, ExtractionMetadata, ExtractionStats, FieldObservation, ParameterKind,
    VariantExtraction,
};
use specsheet_utils::{ExtractionConfig, SpecsheetResult};

use crate::ai_client::AiExtractor;
use crate::patterns::PatternExtractor;
use crate::pdf_reader;
use crate::reconcile::reconcile;

pub struct IntegratedExtractor {
    patterns: PatternExtractor,
    ai: Option<AiExtractor>,
    config: ExtractionConfig,
}

impl IntegratedExtractor {
    pub fn new(ai: Option<AiExtractor>, config: ExtractionConfig) -> Self {
        Self {
            patterns: PatternExtractor::new(),
            ai,
            config,
        }
    }

    /// Extracts one datasheet from its PDF bytes.
    pub async fn extract(
        &self,
        data: &[u8],
        filename: &str,
    ) -> SpecsheetResult<(DatasheetExtraction, ExtractionStats)> {
        let text = pdf_reader::read_pdf_text(data)?;
        let mut result = self.extract_from_text(&text, filename).await;
        result.1.file_size = data.len();
        Ok(result)
    }

    /// The pipeline after text acquisition; infallible because every
    /// downstream failure degrades to a smaller result.
    pub async fn extract_from_text(
        &self,
        text: &str,
        filename: &str,
    ) -> (DatasheetExtraction, ExtractionStats) {
        let started = Instant::now();

        let mut supplier = self.patterns.identify_supplier(text, filename);
        let mut product_family = self.patterns.identify_product_family(text);
        let mut part_numbers = self.patterns.extract_part_numbers(text);

        let pattern_fields = self.patterns.extract_fields(text);
        let pattern_found: Vec<&FieldObservation> = pattern_fields
            .iter()
            .filter(|o| o.outcome.is_found())
            .collect();
        let pattern_confidence_avg = average_confidence(&pattern_found);

        let mut stats = ExtractionStats {
            pattern_extracted: pattern_found.len(),
            pattern_confidence_avg,
            text_chars: text.chars().count(),
            ..Default::default()
        };

        let needs_ai = self.needs_ai(
            pattern_found.len(),
            pattern_confidence_avg,
            &supplier,
            &part_numbers,
        );

        let mut ai_fields: Vec<FieldObservation> = Vec::new();
        if needs_ai {
            if let Some(ai) = &self.ai {
                let missing = self.fields_to_resolve(&pattern_fields);
                debug!(fields = missing.len(), "Consulting AI fallback");
                ai_fields = ai.resolve_fields(text, &missing).await;

                if supplier == "Unknown" || part_numbers.is_empty() {
                    match ai.extract_identity(text, filename).await {
                        Ok(identity) => {
                            if supplier == "Unknown" {
                                if let Some(s) = identity.supplier {
                                    supplier = s;
                                }
                            }
                            if product_family == "General Electronics" {
                                if let Some(f) = identity.product_family {
                                    product_family = f;
                                }
                            }
                            if part_numbers.is_empty() {
                                part_numbers = identity.part_numbers;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "AI identity extraction failed, keeping pattern identity");
                        }
                    }
                }
            }
        }

        let ai_found: Vec<&FieldObservation> =
            ai_fields.iter().filter(|o| o.outcome.is_found()).collect();
        stats.ai_extracted = ai_found.len();
        stats.ai_confidence_avg = average_confidence(&ai_found);

        let parameters = reconcile(
            &pattern_fields,
            &ai_fields,
            self.config.high_confidence_threshold,
        );

        // No labeled part number anywhere: fall back to the filename stem,
        // as one anonymous variant is better than losing the datasheet.
        if part_numbers.is_empty() {
            part_numbers.push(filename_stem(filename));
        }

        let variants: Vec<VariantExtraction> = part_numbers
            .into_iter()
            .map(|part_number| VariantExtraction {
                part_number,
                description: String::new(),
                parameters: parameters.clone(),
            })
            .collect();

        let extraction = DatasheetExtraction {
            supplier,
            product_family,
            variants,
            extraction_date: Utc::now(),
            metadata: ExtractionMetadata {
                pattern_parameters: stats.pattern_extracted,
                ai_parameters: stats.ai_extracted,
                merged: !ai_fields.is_empty(),
            },
        };

        stats.total_parameters = extraction.parameter_count();
        stats.execution_time_ms = started.elapsed().as_millis() as u64;

        info!(
            supplier = %extraction.supplier,
            variants = extraction.variants.len(),
            parameters = stats.total_parameters,
            ai_consulted = needs_ai && self.ai.is_some(),
            "Extraction completed"
        );

        (extraction, stats)
    }

    /// AI is consulted when the pattern pass looks thin: too few fields,
    /// weak average confidence, or an unidentifiable datasheet.
    fn needs_ai(
        &self,
        pattern_count: usize,
        pattern_confidence_avg: f64,
        supplier: &str,
        part_numbers: &[String],
    ) -> bool {
        pattern_count < self.config.min_parameters_threshold
            || pattern_confidence_avg < self.config.min_pattern_confidence
            || supplier == "Unknown"
            || part_numbers.is_empty()
    }

    /// Fields worth asking the AI about: absent, or matched below the
    /// per-field confidence floor.
    fn fields_to_resolve(&self, pattern_fields: &[FieldObservation]) -> Vec<ParameterKind> {
        pattern_fields
            .iter()
            .filter(|o| o.outcome.confidence() < self.config.min_pattern_confidence)
            .map(|o| o.kind.clone())
            .collect()
    }
}

fn average_confidence(found: &[&FieldObservation]) -> f64 {
    if found.is_empty() {
        return 0.0;
    }
    found.iter().map(|o| o.outcome.confidence()).sum::<f64>() / found.len() as f64
}

fn filename_stem(filename: &str) -> String {
    let stem = filename
        .rsplit('/')
        .next()
        .unwrap_or(filename)
        .trim_end_matches(".pdf")
        .trim_end_matches(".PDF");
    stem.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsheet_models::{ExtractionSource, ParameterValue};

    fn pattern_only() -> IntegratedExtractor {
        IntegratedExtractor::new(None, default_config())
    }

    fn default_config() -> ExtractionConfig {
        ExtractionConfig {
            high_confidence_threshold: 0.8,
            min_pattern_confidence: 0.6,
            min_parameters_threshold: 3,
            max_text_chars: 15_000,
        }
    }

    const SAMPLE: &str = "\
Finisar FTLX8571D3BCL 10G SFP+ optical transceiver
P/N: FTLX8571D3BCL
Operating Temperature: -40°C to 85°C
Data Rate: 10.3125 Gbps
Center Wavelength: 850 nm
Power Consumption: 1000 mW
Reach: 300 m
Supply Voltage: 3.3 V";

    #[tokio::test]
    async fn test_pattern_only_pipeline_on_rich_text() {
        let (extraction, stats) = pattern_only()
            .extract_from_text(SAMPLE, "ftlx8571.pdf")
            .await;

        assert_eq!(extraction.supplier, "Finisar");
        assert_eq!(extraction.product_family, "Optical Transceivers");
        assert_eq!(extraction.variants.len(), 1);
        assert_eq!(extraction.variants[0].part_number, "FTLX8571D3BCL");

        let params = &extraction.variants[0].parameters;
        assert!(params.len() >= 5);
        assert!(params.iter().all(|p| p.source == ExtractionSource::Pattern));

        let temp = params
            .iter()
            .find(|p| p.kind == ParameterKind::TemperatureRange)
            .unwrap();
        assert_eq!(temp.value, ParameterValue::range(-40.0, 85.0));

        assert_eq!(stats.pattern_extracted, params.len());
        assert_eq!(stats.ai_extracted, 0);
    }

    #[tokio::test]
    async fn test_sparse_text_degrades_to_filename_variant() {
        let (extraction, stats) = pattern_only()
            .extract_from_text("An unremarkable document.", "mystery datasheet.pdf")
            .await;

        assert_eq!(extraction.supplier, "Unknown");
        assert_eq!(extraction.variants.len(), 1);
        assert_eq!(extraction.variants[0].part_number, "mystery_datasheet");
        assert!(extraction.variants[0].parameters.is_empty());
        assert_eq!(stats.total_parameters, 0);
    }

    #[tokio::test]
    async fn test_multiple_part_numbers_share_parameters() {
        let text = format!("{}\nModel Number: FTLX8571D3BCV", SAMPLE);
        let (extraction, _) = pattern_only().extract_from_text(&text, "x.pdf").await;

        assert_eq!(extraction.variants.len(), 2);
        assert_eq!(
            extraction.variants[0].parameters,
            extraction.variants[1].parameters
        );
    }

    #[test]
    fn test_needs_ai_triggers() {
        let extractor = pattern_only();
        let parts = vec!["A".to_string()];

        // Healthy pattern pass: no AI.
        assert!(!extractor.needs_ai(5, 0.9, "Finisar", &parts));
        // Too few parameters.
        assert!(extractor.needs_ai(2, 0.9, "Finisar", &parts));
        // Weak confidence.
        assert!(extractor.needs_ai(5, 0.5, "Finisar", &parts));
        // Unidentified supplier.
        assert!(extractor.needs_ai(5, 0.9, "Unknown", &parts));
        // No part numbers.
        assert!(extractor.needs_ai(5, 0.9, "Finisar", &[]));
    }

    #[test]
    fn test_filename_stem() {
        assert_eq!(filename_stem("uploads/TC GDT 001.pdf"), "TC_GDT_001");
        assert_eq!(filename_stem("plain.PDF"), "plain");
    }
}
