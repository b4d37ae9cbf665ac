//! Parameter vocabulary for the datasheet comparison system.
//!
//! `ParameterKind` is a closed enumeration of the fields the system knows how
//! to extract. Each kind carries its own category, unit vocabulary, expected
//! numeric range and value parser; rule selection is a lookup over
//! `ParameterKind::RECOGNIZED` rather than runtime type inspection.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Category a parameter belongs to, used for grouping in comparison views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterCategory {
    Environmental,
    Performance,
    Optical,
    Electrical,
    Physical,
    General,
}

impl ParameterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environmental => "environmental",
            Self::Performance => "performance",
            Self::Optical => "optical",
            Self::Electrical => "electrical",
            Self::Physical => "physical",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "environmental" => Self::Environmental,
            "performance" => Self::Performance,
            "optical" => Self::Optical,
            "electrical" => Self::Electrical,
            "physical" => Self::Physical,
            _ => Self::General,
        }
    }
}

/// How a parameter value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Pattern,
    Ai,
    Merged,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Ai => "ai",
            Self::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ai" => Self::Ai,
            "merged" => Self::Merged,
            _ => Self::Pattern,
        }
    }
}

/// A recognized datasheet field, or an `Unrecognized` name carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ParameterKind {
    TemperatureRange,
    DataRate,
    Wavelength,
    PowerConsumption,
    Reach,
    Voltage,
    Dimensions,
    Unrecognized(String),
}

impl ParameterKind {
    /// The recognized vocabulary, in extraction order.
    pub const RECOGNIZED: [ParameterKind; 7] = [
        ParameterKind::TemperatureRange,
        ParameterKind::DataRate,
        ParameterKind::Wavelength,
        ParameterKind::PowerConsumption,
        ParameterKind::Reach,
        ParameterKind::Voltage,
        ParameterKind::Dimensions,
    ];

    pub fn name(&self) -> &str {
        match self {
            Self::TemperatureRange => "temperature_range",
            Self::DataRate => "data_rate",
            Self::Wavelength => "wavelength",
            Self::PowerConsumption => "power_consumption",
            Self::Reach => "reach",
            Self::Voltage => "voltage",
            Self::Dimensions => "dimensions",
            Self::Unrecognized(name) => name,
        }
    }

    /// Maps a field name onto the vocabulary; unknown names are tagged
    /// `Unrecognized`, never silently coerced.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        Self::RECOGNIZED
            .iter()
            .find(|k| k.name() == normalized)
            .cloned()
            .unwrap_or(Self::Unrecognized(name.trim().to_string()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    pub fn category(&self) -> ParameterCategory {
        match self {
            Self::TemperatureRange => ParameterCategory::Environmental,
            Self::DataRate | Self::Reach => ParameterCategory::Performance,
            Self::Wavelength => ParameterCategory::Optical,
            Self::PowerConsumption | Self::Voltage => ParameterCategory::Electrical,
            Self::Dimensions => ParameterCategory::Physical,
            Self::Unrecognized(_) => ParameterCategory::General,
        }
    }

    /// Units this kind is normally quoted in, standardized spelling.
    pub fn expected_units(&self) -> &'static [&'static str] {
        match self {
            Self::TemperatureRange => &["°C"],
            Self::DataRate => &["Gbps", "Mbps", "kbps", "bps"],
            Self::Wavelength => &["nm"],
            Self::PowerConsumption => &["mW", "W"],
            Self::Reach => &["m", "km"],
            Self::Voltage => &["V"],
            Self::Dimensions => &["mm", "cm", "in"],
            Self::Unrecognized(_) => &[],
        }
    }

    /// Plausible numeric bounds across the kind's common units. Wide by
    /// intent: this backs a confidence heuristic, not validation.
    pub fn expected_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::TemperatureRange => Some((-100.0, 200.0)),
            Self::DataRate => Some((0.0, 2000.0)),
            Self::Wavelength => Some((600.0, 2100.0)),
            Self::PowerConsumption => Some((0.0, 5000.0)),
            Self::Reach => Some((0.0, 200_000.0)),
            Self::Voltage => Some((0.0, 60.0)),
            Self::Dimensions | Self::Unrecognized(_) => None,
        }
    }

    /// Parses a raw value string into this kind's value shape. Returns
    /// `None` when the text does not form a valid value for the kind.
    pub fn parse_value(&self, raw: &str) -> Option<ParameterValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            Self::TemperatureRange => {
                let re =
                    Regex::new(r"([+-]?\d+(?:\.\d+)?)\s*(?:to|[-–~])\s*([+-]?\d+(?:\.\d+)?)")
                        .unwrap();
                let caps = re.captures(raw)?;
                let a: f64 = caps[1].parse().ok()?;
                let b: f64 = caps[2].parse().ok()?;
                Some(ParameterValue::range(a, b))
            }
            Self::Dimensions => {
                let re = Regex::new(
                    r"(\d+(?:\.\d+)?)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*[xX×]\s*(\d+(?:\.\d+)?)",
                )
                .unwrap();
                let caps = re.captures(raw)?;
                Some(ParameterValue::Text(format!(
                    "{}x{}x{}",
                    &caps[1], &caps[2], &caps[3]
                )))
            }
            Self::Unrecognized(_) => Some(ParameterValue::Text(raw.to_string())),
            _ => {
                let re = Regex::new(r"[+-]?\d+(?:\.\d+)?").unwrap();
                let m = re.find(raw)?;
                m.as_str().parse().ok().map(ParameterValue::Numeric)
            }
        }
    }

    /// Whether a value has the shape this kind requires.
    pub fn accepts(&self, value: &ParameterValue) -> bool {
        match self {
            Self::TemperatureRange => matches!(value, ParameterValue::Range { .. }),
            Self::Dimensions | Self::Unrecognized(_) => true,
            _ => matches!(value, ParameterValue::Numeric(_)),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ParameterKind> for String {
    fn from(kind: ParameterKind) -> Self {
        kind.name().to_string()
    }
}

impl From<String> for ParameterKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// An extracted value: a single number, a low/high range, or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterValue {
    Numeric(f64),
    Range { low: f64, high: f64 },
    Text(String),
}

impl ParameterValue {
    /// Builds a range with low < high regardless of argument order.
    pub fn range(a: f64, b: f64) -> Self {
        if a <= b {
            Self::Range { low: a, high: b }
        } else {
            Self::Range { low: b, high: a }
        }
    }

    /// Numeric magnitude used for ordering in comparison views. Ranges
    /// order by their high bound unless `use_low` is set.
    pub fn magnitude(&self, use_low: bool) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Range { low, high } => Some(if use_low { *low } else { *high }),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{}", v),
            Self::Range { low, high } => write!(f, "{} to {}", low, high),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One named, unit-qualified parameter of a part variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub value: ParameterValue,
    pub unit: String,
    pub category: ParameterCategory,
    #[validate(range(min = 0.0, max = 1.0, message = "Confidence must be between 0.0 and 1.0"))]
    pub confidence: f64,
    pub source: ExtractionSource,
}

impl Parameter {
    pub fn new(
        kind: ParameterKind,
        value: ParameterValue,
        unit: impl Into<String>,
        confidence: f64,
        source: ExtractionSource,
    ) -> Self {
        let category = kind.category();
        Self {
            kind,
            value,
            unit: unit.into(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_lookup() {
        assert_eq!(
            ParameterKind::from_name("temperature_range"),
            ParameterKind::TemperatureRange
        );
        assert_eq!(
            ParameterKind::from_name("Data Rate"),
            ParameterKind::DataRate
        );
        assert_eq!(
            ParameterKind::from_name("insertion_loss"),
            ParameterKind::Unrecognized("insertion_loss".to_string())
        );
    }

    #[test]
    fn test_range_parse_orders_bounds() {
        let v = ParameterKind::TemperatureRange
            .parse_value("85 to -40")
            .unwrap();
        assert_eq!(v, ParameterValue::Range { low: -40.0, high: 85.0 });
    }

    #[test]
    fn test_numeric_kind_rejects_text() {
        assert!(ParameterKind::DataRate.parse_value("fast").is_none());
        assert_eq!(
            ParameterKind::DataRate.parse_value("10.3125"),
            Some(ParameterValue::Numeric(10.3125))
        );
    }

    #[test]
    fn test_accepts_value_shape() {
        let range = ParameterValue::range(-40.0, 85.0);
        assert!(ParameterKind::TemperatureRange.accepts(&range));
        assert!(!ParameterKind::Wavelength.accepts(&range));
        assert!(ParameterKind::Wavelength.accepts(&ParameterValue::Numeric(1310.0)));
    }

    #[test]
    fn test_kind_serde_as_name() {
        let json = serde_json::to_string(&ParameterKind::PowerConsumption).unwrap();
        assert_eq!(json, "\"power_consumption\"");
        let back: ParameterKind = serde_json::from_str("\"wavelength\"").unwrap();
        assert_eq!(back, ParameterKind::Wavelength);
    }
}
