//! Reconciler
//!
//! Merges pattern-derived and AI-derived field observations into one
//! authoritative parameter set. Deterministic heuristics outrank generative
//! output: a confident pattern match wins outright, AI is the fallback of
//! record when patterns fail, and a low-confidence agreement keeps the
//! pattern value at the lower of the two confidences.

use specsheet_models::{
    ExtractionSource, FieldObservation, FieldOutcome, Parameter, ParameterKind,
};

/// Merge rule, per recognized field:
/// 1. pattern confidence ≥ `high_threshold` → pattern value, source Pattern;
/// 2. else AI value present and valid for the kind → AI value, source Ai;
/// 3. else pattern present and AI answered invalidly → pattern value,
///    source Merged, lower of the two confidences;
/// 4. else pattern only → pattern value at its own confidence;
/// 5. else absent — not an error.
///
/// Idempotent, and never yields two parameters of the same kind.
pub fn reconcile(
    pattern_fields: &[FieldObservation],
    ai_fields: &[FieldObservation],
    high_threshold: f64,
) -> Vec<Parameter> {
    ParameterKind::RECOGNIZED
        .iter()
        .filter_map(|kind| {
            let pattern = find_found(pattern_fields, kind);
            let ai = find_found(ai_fields, kind);
            reconcile_field(kind, pattern, ai, high_threshold)
        })
        .collect()
}

fn find_found<'a>(
    observations: &'a [FieldObservation],
    kind: &ParameterKind,
) -> Option<&'a FieldObservation> {
    observations
        .iter()
        .find(|o| &o.kind == kind && o.outcome.is_found())
}

fn reconcile_field(
    kind: &ParameterKind,
    pattern: Option<&FieldObservation>,
    ai: Option<&FieldObservation>,
    high_threshold: f64,
) -> Option<Parameter> {
    let ai_valid = ai.filter(|o| match &o.outcome {
        FieldOutcome::Found { value, .. } => kind.accepts(value),
        FieldOutcome::Absent => false,
    });

    match (pattern, ai_valid) {
        (Some(p), _) if p.outcome.confidence() >= high_threshold => {
            Some(to_parameter(kind, p, ExtractionSource::Pattern, None))
        }
        (_, Some(a)) => Some(to_parameter(kind, a, ExtractionSource::Ai, None)),
        (Some(p), None) => match ai {
            // AI answered but not with a valid value for this kind: keep
            // the pattern value, recording the lower confidence.
            Some(a) => {
                let confidence = p.outcome.confidence().min(a.outcome.confidence());
                Some(to_parameter(kind, p, ExtractionSource::Merged, Some(confidence)))
            }
            None => Some(to_parameter(kind, p, ExtractionSource::Pattern, None)),
        },
        (None, None) => None,
    }
}

fn to_parameter(
    kind: &ParameterKind,
    observation: &FieldObservation,
    source: ExtractionSource,
    confidence_override: Option<f64>,
) -> Parameter {
    match &observation.outcome {
        FieldOutcome::Found {
            value,
            unit,
            confidence,
        } => Parameter::new(
            kind.clone(),
            value.clone(),
            unit.clone(),
            confidence_override.unwrap_or(*confidence),
            source,
        ),
        // find_found only returns Found observations.
        FieldOutcome::Absent => unreachable!("reconciled an absent observation"),
    }
}
