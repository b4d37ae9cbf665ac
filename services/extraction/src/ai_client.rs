//! AI Fallback Extractor
//!
//! Resolves fields the pattern pass missed by asking a Mistral-style chat
//! model for a structured JSON reply. Failures never escape this module:
//! a call that exhausts its retries, or a reply that cannot be parsed,
//! leaves the requested fields absent and the pipeline continues with
//! whatever the patterns found.

use serde_json::Value;
use tracing::{info, warn};

use specsheet_models::{FieldObservation, ParameterKind};
use specsheet_utils::{extract_json, MistralClient, SpecsheetResult};

use crate::patterns::normalize_unit;
use crate::pdf_reader::truncate_for_prompt;

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a technical datasheet analyst. \
Extract the requested electrical and optical parameters from the datasheet text. \
Reply with a single JSON object and nothing else. Each requested field is a key; \
its value is an object with \"value\", \"unit\" and \"confidence\" (0.0 to 1.0). \
Use null for fields the text does not specify.";

const DATASHEET_SYSTEM_PROMPT: &str = "You are a technical datasheet analyst. \
Identify the supplier, product family and part numbers in the datasheet text. \
Reply with a single JSON object with keys \"supplier\", \"product_family\" and \
\"part_numbers\" (an array of strings). Use null for anything the text does not specify.";

/// Identity fields recovered by full-document AI extraction.
#[derive(Debug, Clone, Default)]
pub struct AiDatasheetIdentity {
    pub supplier: Option<String>,
    pub product_family: Option<String>,
    pub part_numbers: Vec<String>,
}

pub struct AiExtractor {
    client: MistralClient,
    max_text_chars: usize,
}

impl AiExtractor {
    pub fn new(client: MistralClient, max_text_chars: usize) -> Self {
        Self {
            client,
            max_text_chars,
        }
    }

    /// Asks the model for the listed fields. Infallible by contract: any
    /// failure degrades to every requested field being absent.
    pub async fn resolve_fields(
        &self,
        text: &str,
        missing: &[ParameterKind],
    ) -> Vec<FieldObservation> {
        if missing.is_empty() {
            return Vec::new();
        }

        let reply = match self.request_fields(text, missing).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, fields = missing.len(), "AI field resolution failed, fields stay absent");
                return missing
                    .iter()
                    .map(|k| FieldObservation::absent(k.clone()))
                    .collect();
            }
        };

        let parsed = match extract_json(&reply) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "AI reply did not contain JSON, fields stay absent");
                return missing
                    .iter()
                    .map(|k| FieldObservation::absent(k.clone()))
                    .collect();
            }
        };

        let observations: Vec<FieldObservation> = missing
            .iter()
            .map(|kind| observation_from_json(kind, parsed.get(kind.name())))
            .collect();

        let found = observations.iter().filter(|o| o.outcome.is_found()).count();
        info!(requested = missing.len(), found, "AI field resolution completed");
        observations
    }

    /// Full-document identity extraction, used when the patterns could not
    /// name a supplier, family or part number.
    pub async fn extract_identity(
        &self,
        text: &str,
        filename: &str,
    ) -> SpecsheetResult<AiDatasheetIdentity> {
        let excerpt = truncate_for_prompt(text, self.max_text_chars);
        let user = format!("Datasheet file: {}\n\nDatasheet text:\n{}", filename, excerpt);

        let reply = self.client.chat(DATASHEET_SYSTEM_PROMPT, &user).await?;
        let parsed = extract_json(&reply)?;

        Ok(identity_from_json(&parsed))
    }

    async fn request_fields(
        &self,
        text: &str,
        missing: &[ParameterKind],
    ) -> SpecsheetResult<String> {
        let field_list = missing
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ");
        let excerpt = truncate_for_prompt(text, self.max_text_chars);
        let user = format!(
            "Fields to extract: {}\n\nDatasheet text:\n{}",
            field_list, excerpt
        );

        self.client.chat(EXTRACTION_SYSTEM_PROMPT, &user).await
    }
}

/// Builds an observation from one field's JSON object. Anything that does
/// not parse to a valid value for the kind is absent.
fn observation_from_json(kind: &ParameterKind, field: Option<&Value>) -> FieldObservation {
    let Some(obj) = field.filter(|v| !v.is_null()) else {
        return FieldObservation::absent(kind.clone());
    };

    let raw_value = match obj.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return FieldObservation::absent(kind.clone()),
    };

    let Some(value) = kind.parse_value(&raw_value) else {
        return FieldObservation::absent(kind.clone());
    };
    if !kind.accepts(&value) {
        return FieldObservation::absent(kind.clone());
    }

    let unit = obj
        .get("unit")
        .and_then(Value::as_str)
        .map(normalize_unit)
        .unwrap_or_default();
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.7)
        .clamp(0.0, 1.0);

    FieldObservation::found(kind.clone(), value, unit, confidence)
}

/// Shapes a raw identity reply. Part numbers are trimmed and deduplicated
/// in order of appearance; a part the model repeats must not become two
/// variants of the same datasheet.
fn identity_from_json(parsed: &Value) -> AiDatasheetIdentity {
    let mut part_numbers: Vec<String> = Vec::new();
    if let Some(arr) = parsed.get("part_numbers").and_then(Value::as_array) {
        for part in arr.iter().filter_map(Value::as_str) {
            let part = part.trim().to_string();
            if !part.is_empty() && !part_numbers.contains(&part) {
                part_numbers.push(part);
            }
        }
    }

    AiDatasheetIdentity {
        supplier: non_empty_string(parsed.get("supplier")),
        product_family: non_empty_string(parsed.get("product_family")),
        part_numbers,
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specsheet_models::{FieldOutcome, ParameterValue};

    #[test]
    fn test_observation_from_valid_field() {
        let field = json!({"value": "850", "unit": "nm", "confidence": 0.85});
        let obs = observation_from_json(&ParameterKind::Wavelength, Some(&field));

        assert_eq!(
            obs.outcome,
            FieldOutcome::Found {
                value: ParameterValue::Numeric(850.0),
                unit: "nm".to_string(),
                confidence: 0.85,
            }
        );
    }

    #[test]
    fn test_observation_from_numeric_json_value() {
        let field = json!({"value": 3.3, "unit": "v"});
        let obs = observation_from_json(&ParameterKind::Voltage, Some(&field));

        match obs.outcome {
            FieldOutcome::Found { value, unit, confidence } => {
                assert_eq!(value, ParameterValue::Numeric(3.3));
                assert_eq!(unit, "V");
                assert!((confidence - 0.7).abs() < 1e-9);
            }
            FieldOutcome::Absent => panic!("expected found"),
        }
    }

    #[test]
    fn test_observation_wrong_shape_is_absent() {
        // A bare number is not a valid temperature range.
        let field = json!({"value": "85", "unit": "°C"});
        let obs = observation_from_json(&ParameterKind::TemperatureRange, Some(&field));
        assert_eq!(obs.outcome, FieldOutcome::Absent);
    }

    #[test]
    fn test_observation_null_or_missing_is_absent() {
        let null = Value::Null;
        assert_eq!(
            observation_from_json(&ParameterKind::Reach, Some(&null)).outcome,
            FieldOutcome::Absent
        );
        assert_eq!(
            observation_from_json(&ParameterKind::Reach, None).outcome,
            FieldOutcome::Absent
        );
    }

    #[test]
    fn test_observation_clamps_confidence() {
        let field = json!({"value": "10", "unit": "km", "confidence": 7.0});
        let obs = observation_from_json(&ParameterKind::Reach, Some(&field));
        assert!(obs.outcome.confidence() <= 1.0);
    }

    #[test]
    fn test_identity_deduplicates_part_numbers() {
        let parsed = json!({
            "supplier": " Finisar ",
            "product_family": null,
            "part_numbers": ["FTLX8571D3BCL", " FTLX8571D3BCL ", "", "FTLX8571D3BCV"]
        });

        let identity = identity_from_json(&parsed);
        assert_eq!(identity.supplier.as_deref(), Some("Finisar"));
        assert_eq!(identity.product_family, None);
        assert_eq!(
            identity.part_numbers,
            vec!["FTLX8571D3BCL", "FTLX8571D3BCV"]
        );
    }

    #[test]
    fn test_identity_tolerates_missing_keys() {
        let identity = identity_from_json(&json!({}));
        assert_eq!(identity.supplier, None);
        assert!(identity.part_numbers.is_empty());
    }

    #[tokio::test]
    async fn test_retry_exhaustion_leaves_fields_absent() {
        // Nothing listens on port 1, so every attempt fails as transient
        // and the retry budget is spent.
        let mut config = specsheet_utils::AppConfig::default().ai;
        config.api_key = "test-key".to_string();
        config.api_url = "http://127.0.0.1:1".to_string();
        config.timeout_seconds = 2;
        config.max_retries = 3;
        config.retry_base_delay_ms = 1;

        let extractor = AiExtractor::new(MistralClient::new(&config).unwrap(), 15_000);
        let missing = vec![ParameterKind::Wavelength, ParameterKind::Reach];

        let observations = extractor.resolve_fields("Wavelength: unclear", &missing).await;

        assert_eq!(observations.len(), 2);
        assert!(observations
            .iter()
            .all(|o| o.outcome == FieldOutcome::Absent));
        assert_eq!(observations[0].kind, ParameterKind::Wavelength);
        assert_eq!(observations[1].kind, ParameterKind::Reach);
    }
}
