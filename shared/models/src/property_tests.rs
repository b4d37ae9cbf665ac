//! Property-based tests for model serialization and parameter parsing.

use proptest::prelude::*;

use crate::parameter::{
    ExtractionSource, Parameter, ParameterKind, ParameterValue,
};

proptest! {
    /// Serializing and deserializing a parameter preserves it exactly.
    #[test]
    fn prop_parameter_serde_roundtrip(
        value in -1000.0f64..1000.0,
        confidence in 0.0f64..=1.0,
    ) {
        let param = Parameter::new(
            ParameterKind::Wavelength,
            ParameterValue::Numeric(value),
            "nm",
            confidence,
            ExtractionSource::Pattern,
        );
        let json = serde_json::to_string(&param).unwrap();
        let back: Parameter = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(param, back);
    }

    /// A constructed range always satisfies low <= high.
    #[test]
    fn prop_range_is_ordered(a in -500.0f64..500.0, b in -500.0f64..500.0) {
        match ParameterValue::range(a, b) {
            ParameterValue::Range { low, high } => prop_assert!(low <= high),
            other => prop_assert!(false, "expected range, got {:?}", other),
        }
    }

    /// Confidence is clamped into [0, 1] on construction.
    #[test]
    fn prop_confidence_clamped(confidence in -2.0f64..3.0) {
        let param = Parameter::new(
            ParameterKind::Voltage,
            ParameterValue::Numeric(3.3),
            "V",
            confidence,
            ExtractionSource::Ai,
        );
        prop_assert!((0.0..=1.0).contains(&param.confidence));
    }

    /// Any vocabulary name survives the name -> kind -> name roundtrip.
    #[test]
    fn prop_kind_name_roundtrip(idx in 0usize..7) {
        let kind = ParameterKind::RECOGNIZED[idx].clone();
        prop_assert_eq!(ParameterKind::from_name(kind.name()), kind);
    }
}
