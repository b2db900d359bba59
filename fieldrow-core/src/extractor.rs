use crate::config::ExtractionConfig;
use crate::rules::{expand_wildcards, postprocess, resolve, ExpandedRules};
use crate::schema::LabelSchema;
use crate::sectionizer::sectionize;
use crate::types::ExtractionRow;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for extraction steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = (duration.as_secs_f64() / total.as_secs_f64()) * 100.0;
            println!(
                "   {:.<30} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<30} {:.0}ms", "Total", total.as_millis());
    }
}

/// The extraction engine: one schema, one expanded rule set, many documents.
///
/// Purely synchronous and free of shared mutable state: extracting many
/// documents in parallel needs no locking, each call is independent.
pub struct FieldExtractor {
    schema: LabelSchema,
    rules: ExpandedRules,
}

impl FieldExtractor {
    pub fn new(schema: LabelSchema, config: &ExtractionConfig) -> Self {
        let rules = expand_wildcards(&config.templates, config.max_repeat);
        Self { schema, rules }
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    pub fn rules(&self) -> &ExpandedRules {
        &self.rules
    }

    /// Extract one schema-ordered row from one document's plain text.
    pub fn extract(&self, text: &str) -> ExtractionRow {
        self.extract_with_profiler(text, &mut StepProfiler::new(false))
    }

    /// Extract with step timings collected into `profiler`.
    pub fn extract_with_profiler(
        &self,
        text: &str,
        profiler: &mut StepProfiler,
    ) -> ExtractionRow {
        let sections = profiler.time_step("Sectionize", || sectionize(text));

        let resolved = profiler.time_step("Resolve Fields", || {
            self.schema
                .iter()
                .map(|label| {
                    let raw = resolve(label, &self.rules, &sections, text);
                    (label.to_string(), postprocess(label, &raw))
                })
                .collect::<Vec<_>>()
        });

        profiler.time_step("Assemble Row", || assemble_row(&self.schema, &resolved))
    }
}

/// Order resolved values by the schema, defaulting unmatched labels to empty
/// strings. The returned row covers the schema exactly: no missing keys, no
/// extras, schema order throughout.
pub fn assemble_row(schema: &LabelSchema, resolved: &[(String, String)]) -> ExtractionRow {
    let values = schema
        .iter()
        .map(|label| {
            let value = resolved
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            (label.to_string(), value)
        })
        .collect();
    ExtractionRow::from_ordered_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(labels: &[&str]) -> LabelSchema {
        LabelSchema::new(labels.iter().map(|l| (*l).to_string()).collect()).unwrap()
    }

    #[test]
    fn assembled_row_covers_schema_exactly_in_order() {
        let schema = schema(&["last", "first", "dob"]);
        let resolved = vec![
            ("dob".to_string(), "01/02/1950".to_string()),
            ("stray".to_string(), "dropped".to_string()),
        ];
        let row = assemble_row(&schema, &resolved);

        let labels: Vec<&str> = row.labels().collect();
        assert_eq!(labels, ["last", "first", "dob"]);
        assert_eq!(row.get("last"), Some(""));
        assert_eq!(row.get("dob"), Some("01/02/1950"));
        assert_eq!(row.get("stray"), None);
    }

    #[test]
    fn extract_resolves_and_postprocesses() {
        let schema = schema(&["last", "first", "dob"]);
        let config = ExtractionConfig::from_yaml_str(
            r#"
last:
  search: ["member name"]
  type: single_line
first:
  search: ["member name"]
  type: single_line
"#,
            "test",
        )
        .unwrap();
        let extractor = FieldExtractor::new(schema, &config);

        let text = "MEMBER INFO:\nmember name: Smith, John\ndob: 01/02/1950";
        let row = extractor.extract(text);

        assert_eq!(row.get("last"), Some("Smith"));
        assert_eq!(row.get("first"), Some("John"));
        assert_eq!(row.get("dob"), Some("01/02/1950"));
    }
}
