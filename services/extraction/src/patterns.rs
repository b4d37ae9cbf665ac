//! Pattern Extractor
//!
//! Applies an ordered table of per-field regex rules to raw datasheet text.
//! For each field the first match wins. Every recognized field appears in
//! the output, explicitly `Absent` when nothing matched.
//!
//! Confidence is heuristic: a standardized unit plus a value inside the
//! field's plausible numeric range scores HIGH, anything else that still
//! matched scores MEDIUM.

use regex::Regex;

use specsheet_models::{FieldObservation, ParameterKind, ParameterValue};

pub const HIGH_CONFIDENCE: f64 = 0.9;
pub const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Vendors commonly seen on transceiver and networking datasheets.
const KNOWN_SUPPLIERS: &[&str] = &[
    "Finisar",
    "Cisco",
    "Juniper",
    "Huawei",
    "Broadcom",
    "Intel",
    "Mellanox",
    "Arista",
    "Nokia",
    "Ericsson",
    "Fujitsu",
    "NEC",
    "Alcatel-Lucent",
    "ZTE",
    "Ciena",
    "ADVA",
    "Infinera",
    "Lumentum",
];

struct FieldRule {
    kind: ParameterKind,
    patterns: Vec<Regex>,
}

pub struct PatternExtractor {
    rules: Vec<FieldRule>,
    part_patterns: Vec<Regex>,
}

impl PatternExtractor {
    pub fn new() -> Self {
        let rules = vec![
            FieldRule {
                kind: ParameterKind::TemperatureRange,
                patterns: vec![
                    Regex::new(
                        r"(?i)(?:operating|storage|case)?\s*temperature(?:\s*range)?\s*[:=]?\s*([+-]?\d+)\s*(?:°|deg)?\s*C?\s*(?:to|[-–~])\s*([+-]?\d+)\s*(?:°|deg)?\s*C",
                    )
                    .unwrap(),
                    Regex::new(
                        r"(?i)(?:operating|temperature)[\s\-_]*range.*?([+-]?\d+)\s*(?:°|deg)?\s*C?\s*(?:to|[-–~])\s*([+-]?\d+)\s*(?:°|deg)?\s*C",
                    )
                    .unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::DataRate,
                patterns: vec![
                    Regex::new(
                        r"(?i)(?:data|bit)\s*rate.*?(\d+(?:\.\d+)?)\s*(Gbps|Gbit/s|Gb/s|Mbps|Mbit/s|Mb/s|kbps|kb/s|bps)",
                    )
                    .unwrap(),
                    Regex::new(
                        r"(?i)(?:speed|bandwidth).*?(\d+(?:\.\d+)?)\s*(Gbps|Gbit/s|Gb/s|Mbps|Mbit/s|Mb/s|kbps|kb/s|bps)",
                    )
                    .unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::Wavelength,
                patterns: vec![
                    Regex::new(r"(?i)wavelength.*?(\d+(?:\.\d+)?)\s*(nm)").unwrap(),
                    Regex::new(r"(?i)(?:λ|lambda).*?(\d+(?:\.\d+)?)\s*(nm)").unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::PowerConsumption,
                patterns: vec![
                    Regex::new(
                        r"(?i)power\s*(?:consumption|dissipation).*?(\d+(?:\.\d+)?)\s*(mW|W)\b",
                    )
                    .unwrap(),
                    Regex::new(r"(?i)(?:power|consumption).*?(\d+(?:\.\d+)?)\s*(mW|W)\b").unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::Reach,
                patterns: vec![
                    Regex::new(
                        r"(?i)(?:reach|distance|transmission\s*distance).*?(\d+(?:\.\d+)?)\s*(km|m)\b",
                    )
                    .unwrap(),
                    Regex::new(r"(?i)transmission.*?(?:up\s*to|max).*?(\d+(?:\.\d+)?)\s*(km|m)\b")
                        .unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::Voltage,
                patterns: vec![
                    Regex::new(
                        r"(?i)(?:supply\s*voltage|voltage|Vcc|Vdd).*?(\d+(?:\.\d+)?)\s*(V)\b",
                    )
                    .unwrap(),
                ],
            },
            FieldRule {
                kind: ParameterKind::Dimensions,
                patterns: vec![
                    Regex::new(
                        r"(?i)(?:dimensions|size).*?(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*(mm|cm|in)\b",
                    )
                    .unwrap(),
                ],
            },
        ];

        let part_patterns = vec![
            Regex::new(
                r"(?i)(?:Model|Part|Product)[\s\-_]*(?:Number|No|#|ID)[\s\-_]*[:=][\s\-_]*([A-Z0-9][A-Za-z0-9_\-]{2,20})",
            )
            .unwrap(),
            Regex::new(r"(?i)P/N[\s\-_]*[:=][\s\-_]*([A-Z0-9][A-Za-z0-9_\-]{2,20})").unwrap(),
            Regex::new(
                r"(?i)(?:Ordering|Order)[\s\-_]*(?:Information|Info|Code)[\s\-_]*[:=][\s\-_]*([A-Z0-9][A-Za-z0-9_\-]{2,20})",
            )
            .unwrap(),
        ];

        Self {
            rules,
            part_patterns,
        }
    }

    /// Runs every field rule against the text. One observation per
    /// recognized field, first regex match wins.
    pub fn extract_fields(&self, text: &str) -> Vec<FieldObservation> {
        self.rules
            .iter()
            .map(|rule| self.apply_rule(rule, text))
            .collect()
    }

    fn apply_rule(&self, rule: &FieldRule, text: &str) -> FieldObservation {
        for pattern in &rule.patterns {
            if let Some(caps) = pattern.captures(text) {
                let (raw_value, raw_unit) = match rule.kind {
                    ParameterKind::TemperatureRange => {
                        (format!("{} to {}", &caps[1], &caps[2]), "°C".to_string())
                    }
                    ParameterKind::Dimensions => (
                        format!("{}x{}x{}", &caps[1], &caps[2], &caps[3]),
                        caps[4].to_string(),
                    ),
                    _ => (caps[1].to_string(), caps[2].to_string()),
                };

                let unit = normalize_unit(&raw_unit);
                let Some(value) = rule.kind.parse_value(&raw_value) else {
                    continue;
                };
                let confidence = score_confidence(&rule.kind, &value, &unit);

                return FieldObservation::found(rule.kind.clone(), value, unit, confidence);
            }
        }

        FieldObservation::absent(rule.kind.clone())
    }

    /// Looks for a known vendor name in the leading text, then the filename.
    pub fn identify_supplier(&self, text: &str, filename: &str) -> String {
        let head: String = text.chars().take(5000).collect::<String>().to_lowercase();
        let filename = filename.to_lowercase();

        for supplier in KNOWN_SUPPLIERS {
            if head.contains(&supplier.to_lowercase()) {
                return supplier.to_string();
            }
        }
        for supplier in KNOWN_SUPPLIERS {
            if filename.contains(&supplier.to_lowercase()) {
                return supplier.to_string();
            }
        }

        "Unknown".to_string()
    }

    /// Keyword lookup over the full text; first family with a hit wins.
    pub fn identify_product_family(&self, text: &str) -> String {
        let families: &[(&str, &[&str])] = &[
            (
                "Optical Transceivers",
                &["transceiver", "sfp", "qsfp", "xfp", "cfp", "optical", "optic"],
            ),
            ("Network Switches", &["switch", "switching", "ethernet switch"]),
            ("Routers", &["router", "routing", "edge router", "core router"]),
            ("Servers", &["server", "rack server", "blade server"]),
            ("Storage", &["storage", "ssd", "hdd", "nas", "san"]),
            ("Wireless", &["wireless", "wifi", "access point", "antenna"]),
        ];

        let text_lower = text.to_lowercase();
        for (family, keywords) in families {
            if keywords.iter().any(|k| text_lower.contains(k)) {
                return family.to_string();
            }
        }

        "General Electronics".to_string()
    }

    /// Part numbers from labeled sections (Model/Part Number, P/N, ordering
    /// code), deduplicated in order of appearance.
    pub fn extract_part_numbers(&self, text: &str) -> Vec<String> {
        let mut part_numbers = Vec::new();
        for pattern in &self.part_patterns {
            for caps in pattern.captures_iter(text) {
                let part = caps[1].trim().to_string();
                if !part.is_empty() && !part_numbers.contains(&part) {
                    part_numbers.push(part);
                }
            }
        }
        part_numbers
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Standardizes common unit spellings ("Gb/s" → "Gbps", "deg C" → "°C").
/// Unknown spellings pass through trimmed.
pub fn normalize_unit(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    let canonical = match key.as_str() {
        "c" | "°c" | "deg c" | "degc" | "degree c" | "degrees c" => "°C",
        "gbps" | "gbit/s" | "gb/s" => "Gbps",
        "mbps" | "mbit/s" | "mb/s" => "Mbps",
        "kbps" | "kbit/s" | "kb/s" => "kbps",
        "bps" => "bps",
        "nm" | "nanometer" | "nanometers" => "nm",
        "mw" | "milliwatt" | "milliwatts" => "mW",
        "w" | "watt" | "watts" => "W",
        "m" | "meter" | "meters" => "m",
        "km" | "kilometer" | "kilometers" => "km",
        "v" | "volt" | "volts" => "V",
        "mm" | "millimeter" | "millimeters" => "mm",
        "cm" | "centimeter" | "centimeters" => "cm",
        "in" | "inch" | "inches" => "in",
        _ => return raw.trim().to_string(),
    };
    canonical.to_string()
}

fn score_confidence(kind: &ParameterKind, value: &ParameterValue, unit: &str) -> f64 {
    let unit_known = kind.expected_units().contains(&unit);
    let value_plausible = match kind.expected_range() {
        Some((min, max)) => match value {
            ParameterValue::Numeric(v) => *v >= min && *v <= max,
            ParameterValue::Range { low, high } => *low >= min && *high <= max,
            ParameterValue::Text(_) => false,
        },
        None => true,
    };

    if unit_known && value_plausible {
        HIGH_CONFIDENCE
    } else {
        MEDIUM_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsheet_models::FieldOutcome;

    fn find<'a>(obs: &'a [FieldObservation], kind: &ParameterKind) -> &'a FieldObservation {
        obs.iter().find(|o| &o.kind == kind).unwrap()
    }

    #[test]
    fn test_temperature_range_canonical_form() {
        let extractor = PatternExtractor::new();
        let obs = extractor.extract_fields("Operating Temperature: -40°C to 85°C");
        let temp = find(&obs, &ParameterKind::TemperatureRange);

        match &temp.outcome {
            FieldOutcome::Found {
                value,
                unit,
                confidence,
            } => {
                assert_eq!(
                    value,
                    &ParameterValue::Range {
                        low: -40.0,
                        high: 85.0
                    }
                );
                assert_eq!(unit, "°C");
                assert!((confidence - HIGH_CONFIDENCE).abs() < 1e-9);
            }
            FieldOutcome::Absent => panic!("temperature range not found"),
        }
    }

    #[test]
    fn test_range_is_ordered_even_when_text_is_not() {
        let extractor = PatternExtractor::new();
        let obs = extractor.extract_fields("Temperature range 85 to -40 C");
        let temp = find(&obs, &ParameterKind::TemperatureRange);

        match &temp.outcome {
            FieldOutcome::Found { value, .. } => match value {
                ParameterValue::Range { low, high } => assert!(low < high),
                other => panic!("expected range, got {:?}", other),
            },
            FieldOutcome::Absent => panic!("temperature range not found"),
        }
    }

    #[test]
    fn test_data_rate_with_alternate_unit_spelling() {
        let extractor = PatternExtractor::new();
        let obs = extractor.extract_fields("Data rate up to 10.3125 Gb/s per channel");
        let rate = find(&obs, &ParameterKind::DataRate);

        match &rate.outcome {
            FieldOutcome::Found { value, unit, .. } => {
                assert_eq!(value, &ParameterValue::Numeric(10.3125));
                assert_eq!(unit, "Gbps");
            }
            FieldOutcome::Absent => panic!("data rate not found"),
        }
    }

    #[test]
    fn test_absent_fields_are_reported_not_omitted() {
        let extractor = PatternExtractor::new();
        let obs = extractor.extract_fields("No technical content here.");

        assert_eq!(obs.len(), ParameterKind::RECOGNIZED.len());
        assert!(obs.iter().all(|o| o.outcome == FieldOutcome::Absent));
    }

    #[test]
    fn test_implausible_value_downgrades_confidence() {
        let extractor = PatternExtractor::new();
        // 9999 nm is outside any transceiver band.
        let obs = extractor.extract_fields("Center wavelength 9999 nm");
        let wl = find(&obs, &ParameterKind::Wavelength);

        assert!((wl.outcome.confidence() - MEDIUM_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_supplier_from_text_then_filename() {
        let extractor = PatternExtractor::new();
        assert_eq!(
            extractor.identify_supplier("Finisar Corporation Product Specification", "x.pdf"),
            "Finisar"
        );
        assert_eq!(
            extractor.identify_supplier("no vendor here", "cisco-sfp-10g.pdf"),
            "Cisco"
        );
        assert_eq!(extractor.identify_supplier("nothing", "nothing.pdf"), "Unknown");
    }

    #[test]
    fn test_product_family_keywords() {
        let extractor = PatternExtractor::new();
        assert_eq!(
            extractor.identify_product_family("10G SFP+ optical transceiver module"),
            "Optical Transceivers"
        );
        assert_eq!(
            extractor.identify_product_family("plain prose"),
            "General Electronics"
        );
    }

    #[test]
    fn test_part_number_extraction_dedupes() {
        let extractor = PatternExtractor::new();
        let text = "P/N: FTLX8571D3BCL ... Part Number: FTLX8571D3BCL ... Model Number: TC-GDT-001";
        let parts = extractor.extract_part_numbers(text);

        assert_eq!(parts, vec!["FTLX8571D3BCL", "TC-GDT-001"]);
    }

    #[test]
    fn test_unit_normalization_table() {
        assert_eq!(normalize_unit("Gb/s"), "Gbps");
        assert_eq!(normalize_unit("deg C"), "°C");
        assert_eq!(normalize_unit("watts"), "W");
        assert_eq!(normalize_unit("furlongs"), "furlongs");
    }
}
