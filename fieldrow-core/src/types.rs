use serde::{Deserialize, Serialize};

/// Marker used in label patterns and schema templates for repeating groups
/// (e.g. `ma_drug*` expands to `ma_drug1`, `ma_drug2`, ...).
pub const WILDCARD_MARKER: char = '*';

/// Reserved section name for text appearing before the first recognized header.
pub const PREAMBLE_SECTION: &str = "_preamble";

/// Matching strategy for one rule. Unknown kinds fail YAML deserialization
/// with a descriptive error at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    SingleLine,
    MultiLine,
    Paragraph,
    Regex,
}

/// Declarative description of how to extract one label (or a wildcard family
/// of labels). Loaded from the YAML rule file, keyed by label pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTemplate {
    /// Search variants, tried in declared order. Used both to select
    /// candidate sections (regex search against section names) and as the
    /// anchor text for line-based strategies.
    pub search: Vec<String>,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Required iff kind is `regex`. Must contain one capture group.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Used iff kind is `paragraph`. Defaults to 2.
    #[serde(default)]
    pub keep_n_sentences: Option<usize>,
}

/// A rule template instantiated for one specific label. Wildcard templates
/// carry the zero-based `row` derived from their 1-based expansion index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcreteRule {
    pub search: Vec<String>,
    pub kind: RuleKind,
    pub pattern: Option<String>,
    pub keep_n_sentences: Option<usize>,
    pub row: Option<usize>,
}

impl ConcreteRule {
    pub fn from_template(template: &RuleTemplate, row: Option<usize>) -> Self {
        Self {
            search: template.search.clone(),
            kind: template.kind,
            pattern: template.pattern.clone(),
            keep_n_sentences: template.keep_n_sentences,
            row,
        }
    }
}

/// One named contiguous text block of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Normalized lowercase header text.
    pub name: String,
    pub body: String,
}

/// Insertion-ordered sections from one document.
///
/// Modeled as an ordered sequence rather than a map so that candidate-section
/// iteration order is an explicit invariant, not incidental map ordering.
/// A repeated header name replaces the earlier body but keeps the position of
/// the first occurrence; bodies are never merged.
#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a section, clearing any earlier body recorded under this name.
    /// Returns the index of the (possibly pre-existing) entry.
    pub fn begin_section(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            self.sections[index].body.clear();
            index
        } else {
            self.sections.push(Section {
                name: name.to_string(),
                body: String::new(),
            });
            self.sections.len() - 1
        }
    }

    pub fn append_line(&mut self, index: usize, line: &str) {
        let body = &mut self.sections[index].body;
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(line);
    }

    /// Trim each body of leading/trailing whitespace. Called once at the end
    /// of sectionizing.
    pub fn trim_bodies(&mut self) {
        for section in &mut self.sections {
            section.body = section.body.trim().to_string();
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.body.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// The complete, schema-ordered output for one document: exactly one value
/// per schema label, in schema order. Created fresh per document and
/// immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRow {
    values: Vec<(String, String)>,
}

impl ExtractionRow {
    pub(crate) fn from_ordered_values(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Labels in schema order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(l, _)| l.as_str())
    }

    /// Values in schema order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
