//! Natural-language querying.
//!
//! A question is classified into a small fixed intent set by keyword
//! matching, the matching comparison rows are fetched, and a handlebars
//! template is filled with their literal values. This is template
//! substitution, not generation; only questions no intent matches are
//! delegated to the AI client, grounded in the stored data.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{info, warn};

use specsheet_database::{ComparisonRow, ParameterRepository, QueryRepository};
use specsheet_models::{ParameterKind, ParameterValue, QueryRecord};
use specsheet_utils::{MistralClient, SpecsheetError, SpecsheetResult};

const QUERY_SYSTEM_PROMPT: &str = "You are a datasheet comparison assistant. \
Answer the question using only the provided stored parameter data. \
If the data cannot answer the question, say so plainly. Keep the answer to one or two sentences.";

const CANNOT_ANSWER: &str =
    "I cannot answer that from the stored datasheet parameters. Try asking about a specific \
parameter, for example \"What is the highest data rate?\".";

/// The fixed intent vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent {
    Highest(ParameterKind),
    Lowest(ParameterKind),
    Compare(ParameterKind),
    Lookup(Option<ParameterKind>),
}

impl QueryIntent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Highest(_) => "highest",
            Self::Lowest(_) => "lowest",
            Self::Compare(_) => "compare",
            Self::Lookup(_) => "lookup",
        }
    }
}

/// Keyword classification. A superlative or comparison word only forms an
/// intent when a parameter is also named; otherwise the question falls
/// through to `Lookup`.
pub fn classify(question: &str) -> QueryIntent {
    let q = question.to_lowercase();
    let kind = locate_parameter(&q);

    let has_any = |words: &[&str]| words.iter().any(|w| q.contains(w));

    if let Some(kind) = kind {
        if has_any(&["compare", "comparison", "versus", " vs ", "difference"]) {
            return QueryIntent::Compare(kind);
        }
        if has_any(&["highest", "maximum", "max", "fastest", "longest", "largest", "top"]) {
            return QueryIntent::Highest(kind);
        }
        if has_any(&["lowest", "minimum", "min", "slowest", "shortest", "smallest", "least"]) {
            return QueryIntent::Lowest(kind);
        }
        return QueryIntent::Lookup(Some(kind));
    }

    QueryIntent::Lookup(None)
}

/// Alias table mapping question words onto the parameter vocabulary.
fn locate_parameter(question: &str) -> Option<ParameterKind> {
    let aliases: &[(&[&str], ParameterKind)] = &[
        (
            &["data rate", "bit rate", "speed", "bandwidth", "gbps"],
            ParameterKind::DataRate,
        ),
        (&["temperature", "temp range"], ParameterKind::TemperatureRange),
        (&["wavelength", "lambda"], ParameterKind::Wavelength),
        (
            &["power consumption", "power"],
            ParameterKind::PowerConsumption,
        ),
        (&["reach", "distance"], ParameterKind::Reach),
        (&["voltage", "volt"], ParameterKind::Voltage),
        (&["dimensions", "size"], ParameterKind::Dimensions),
    ];

    aliases
        .iter()
        .find(|(words, _)| words.iter().any(|w| question.contains(w)))
        .map(|(_, kind)| kind.clone())
}

/// Handlebars answer templates, registered once.
pub struct AnswerTemplates {
    handlebars: Handlebars<'static>,
}

impl AnswerTemplates {
    pub fn new() -> anyhow::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(
                "superlative",
                "The {{direction}} {{parameter}} is {{value}}{{#if unit}} {{unit}}{{/if}} for part {{part_number}}.",
            )
            .context("Failed to register superlative template")?;
        handlebars
            .register_template_string(
                "compare",
                "Comparing {{parameter}} across {{count}} parts: \
{{#each rows}}{{part_number}} ({{supplier}}): {{value}}{{#if unit}} {{unit}}{{/if}}{{#unless @last}}, {{/unless}}{{/each}}.",
            )
            .context("Failed to register compare template")?;
        handlebars
            .register_template_string(
                "lookup",
                "Stored {{parameter}} values: \
{{#each rows}}{{part_number}}: {{value}}{{#if unit}} {{unit}}{{/if}}{{#unless @last}}, {{/unless}}{{/each}}.",
            )
            .context("Failed to register lookup template")?;
        handlebars
            .register_template_string(
                "no_data",
                "No {{parameter}} values are stored yet. Upload datasheets first.",
            )
            .context("Failed to register no_data template")?;

        Ok(Self { handlebars })
    }

    /// Fills the intent's template with the rows' literal values.
    pub fn render(&self, intent: &QueryIntent, rows: &[ComparisonRow]) -> SpecsheetResult<String> {
        let kind = match intent {
            QueryIntent::Highest(k) | QueryIntent::Lowest(k) | QueryIntent::Compare(k) => k,
            QueryIntent::Lookup(Some(k)) => k,
            QueryIntent::Lookup(None) => {
                return Err(SpecsheetError::internal(
                    "lookup without a parameter has no template",
                ))
            }
        };
        let parameter = display_name(kind);

        if rows.is_empty() {
            return self.render_template("no_data", &serde_json::json!({ "parameter": parameter }));
        }

        match intent {
            QueryIntent::Highest(kind) => {
                let row = best_row(kind, rows, true)
                    .ok_or_else(|| SpecsheetError::not_found("no orderable values"))?;
                self.render_template(
                    "superlative",
                    &superlative_data("highest", &parameter, row),
                )
            }
            QueryIntent::Lowest(kind) => {
                let row = best_row(kind, rows, false)
                    .ok_or_else(|| SpecsheetError::not_found("no orderable values"))?;
                self.render_template(
                    "superlative",
                    &superlative_data("lowest", &parameter, row),
                )
            }
            QueryIntent::Compare(_) | QueryIntent::Lookup(_) => {
                let template = if matches!(intent, QueryIntent::Compare(_)) {
                    "compare"
                } else {
                    "lookup"
                };
                self.render_template(
                    template,
                    &serde_json::json!({
                        "parameter": parameter,
                        "count": rows.len(),
                        "rows": rows,
                    }),
                )
            }
        }
    }

    fn render_template(&self, name: &str, data: &serde_json::Value) -> SpecsheetResult<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| SpecsheetError::internal(e.to_string()))
    }
}

fn superlative_data(direction: &str, parameter: &str, row: &ComparisonRow) -> serde_json::Value {
    serde_json::json!({
        "direction": direction,
        "parameter": parameter,
        "value": row.value,
        "unit": row.unit,
        "part_number": row.part_number,
    })
}

/// Human-readable parameter name ("data_rate" → "data rate").
fn display_name(kind: &ParameterKind) -> String {
    kind.name().replace('_', " ")
}

/// The row with the extreme value. Ranges order by their high bound for
/// "highest" and their low bound for "lowest"; rows whose stored value no
/// longer parses are skipped.
fn best_row<'a>(
    kind: &ParameterKind,
    rows: &'a [ComparisonRow],
    highest: bool,
) -> Option<&'a ComparisonRow> {
    let magnitude = |row: &ComparisonRow| -> Option<f64> {
        kind.parse_value(&row.value)?.magnitude(!highest)
    };

    let mut best: Option<(&ComparisonRow, f64)> = None;
    for row in rows {
        let Some(m) = magnitude(row) else { continue };
        best = match best {
            Some((_, current)) if highest && m > current => Some((row, m)),
            Some((_, current)) if !highest && m < current => Some((row, m)),
            None => Some((row, m)),
            keep => keep,
        };
    }
    best.map(|(row, _)| row)
}

/// The answer with its audit fields.
#[derive(Debug, Clone, Serialize)]
pub struct AnsweredQuery {
    pub question: String,
    pub answer: String,
    pub intent: String,
    pub execution_time_ms: u64,
}

pub struct QueryService {
    parameters: Arc<ParameterRepository>,
    queries: Arc<QueryRepository>,
    ai: Option<MistralClient>,
    templates: AnswerTemplates,
}

impl QueryService {
    pub fn new(
        parameters: Arc<ParameterRepository>,
        queries: Arc<QueryRepository>,
        ai: Option<MistralClient>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            parameters,
            queries,
            ai,
            templates: AnswerTemplates::new()?,
        })
    }

    /// Classifies, answers and logs one question.
    pub async fn answer(&self, question: &str) -> SpecsheetResult<AnsweredQuery> {
        let started = Instant::now();
        let intent = classify(question);

        let answer = match &intent {
            QueryIntent::Highest(kind)
            | QueryIntent::Lowest(kind)
            | QueryIntent::Compare(kind)
            | QueryIntent::Lookup(Some(kind)) => {
                let rows = self.parameters.comparison(kind).await?;
                self.templates.render(&intent, &rows)?
            }
            QueryIntent::Lookup(None) => self.freeform_answer(question).await?,
        };

        let execution_time_ms = started.elapsed().as_millis() as u64;
        let record = QueryRecord::new(question, &answer, intent.label(), execution_time_ms);
        self.queries.insert(&record).await?;

        info!(intent = intent.label(), ms = execution_time_ms, "Query answered");

        Ok(AnsweredQuery {
            question: question.to_string(),
            answer,
            intent: intent.label().to_string(),
            execution_time_ms,
        })
    }

    /// Questions no intent matched. With an AI client configured the stored
    /// comparison data grounds a model call; without one the answer is a
    /// fixed refusal.
    async fn freeform_answer(&self, question: &str) -> SpecsheetResult<String> {
        let Some(ai) = &self.ai else {
            return Ok(CANNOT_ANSWER.to_string());
        };

        let context = self.grounding_context().await?;
        if context.is_empty() {
            return Ok(CANNOT_ANSWER.to_string());
        }

        let user = format!("Stored data:\n{}\n\nQuestion: {}", context, question);
        match ai.chat(QUERY_SYSTEM_PROMPT, &user).await {
            Ok(answer) => Ok(answer.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "AI query delegation failed");
                Ok(CANNOT_ANSWER.to_string())
            }
        }
    }

    /// One line per stored value across the recognized vocabulary.
    async fn grounding_context(&self) -> SpecsheetResult<String> {
        let mut lines = Vec::new();
        for kind in &ParameterKind::RECOGNIZED {
            let rows = self.parameters.comparison(kind).await?;
            for row in rows {
                lines.push(format!(
                    "{}: {} {} = {} {}",
                    display_name(kind),
                    row.supplier,
                    row.part_number,
                    row.value,
                    row.unit
                ));
            }
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(supplier: &str, part: &str, value: &str, unit: &str) -> ComparisonRow {
        ComparisonRow {
            supplier: supplier.to_string(),
            part_number: part.to_string(),
            value: value.to_string(),
            unit: unit.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_classify_superlatives() {
        assert_eq!(
            classify("What is the highest data rate?"),
            QueryIntent::Highest(ParameterKind::DataRate)
        );
        assert_eq!(
            classify("Which part has the lowest power consumption?"),
            QueryIntent::Lowest(ParameterKind::PowerConsumption)
        );
        assert_eq!(
            classify("Compare wavelength across suppliers"),
            QueryIntent::Compare(ParameterKind::Wavelength)
        );
    }

    #[test]
    fn test_classify_lookup_fallbacks() {
        assert_eq!(
            classify("Tell me about the reach"),
            QueryIntent::Lookup(Some(ParameterKind::Reach))
        );
        assert_eq!(classify("Is this a good transceiver?"), QueryIntent::Lookup(None));
        // A superlative with no recognizable parameter is still a lookup.
        assert_eq!(classify("What is the highest one?"), QueryIntent::Lookup(None));
    }

    #[test]
    fn test_highest_answer_canonical_form() {
        let templates = AnswerTemplates::new().unwrap();
        let rows = vec![
            row("TechCorp", "TC-GDT-001", "10", "Gbps"),
            row("TechCorp", "TC-GDT-002", "8.5", "Gbps"),
        ];

        let answer = templates
            .render(&QueryIntent::Highest(ParameterKind::DataRate), &rows)
            .unwrap();
        assert_eq!(answer, "The highest data rate is 10 Gbps for part TC-GDT-001.");
    }

    #[test]
    fn test_lowest_orders_ranges_by_low_bound() {
        let templates = AnswerTemplates::new().unwrap();
        let rows = vec![
            row("A", "PART-IND", "-40 to 85", "°C"),
            row("B", "PART-COM", "0 to 70", "°C"),
        ];

        let answer = templates
            .render(&QueryIntent::Lowest(ParameterKind::TemperatureRange), &rows)
            .unwrap();
        assert!(answer.contains("PART-IND"));
        assert!(answer.starts_with("The lowest temperature range is"));
    }

    #[test]
    fn test_compare_lists_every_row_in_order() {
        let templates = AnswerTemplates::new().unwrap();
        let rows = vec![
            row("A", "P1", "850", "nm"),
            row("B", "P2", "1310", "nm"),
        ];

        let answer = templates
            .render(&QueryIntent::Compare(ParameterKind::Wavelength), &rows)
            .unwrap();
        assert_eq!(
            answer,
            "Comparing wavelength across 2 parts: P1 (A): 850 nm, P2 (B): 1310 nm."
        );
    }

    #[test]
    fn test_no_rows_renders_no_data() {
        let templates = AnswerTemplates::new().unwrap();
        let answer = templates
            .render(&QueryIntent::Highest(ParameterKind::Reach), &[])
            .unwrap();
        assert!(answer.contains("No reach values are stored yet"));
    }

    #[test]
    fn test_unparseable_values_are_skipped_for_ordering() {
        let templates = AnswerTemplates::new().unwrap();
        let rows = vec![
            row("A", "BAD", "n/a", "Gbps"),
            row("B", "GOOD", "25", "Gbps"),
        ];

        let answer = templates
            .render(&QueryIntent::Highest(ParameterKind::DataRate), &rows)
            .unwrap();
        assert!(answer.contains("GOOD"));
    }
}
