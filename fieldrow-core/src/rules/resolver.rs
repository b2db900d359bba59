use crate::rules::expander::ExpandedRules;
use crate::sectionizer::is_header_line;
use crate::types::{ConcreteRule, RuleKind, SectionMap};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Default sentence count for paragraph rules.
pub const DEFAULT_KEEP_SENTENCES: usize = 2;

const SINGLE_LINE_CAPTURE_LIMIT: usize = 200;

// Sentence boundary: terminal punctuation, whitespace, then a capital. The
// regex crate has no lookaround, so splits are computed from match offsets
// (split after the punctuation, next sentence starts at the capital).
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+[A-Z]").unwrap());

/// Resolve one label to a value.
///
/// Uses the configured concrete rule when present, otherwise a synthesized
/// default rule, then dispatches to the rule's matching strategy over the
/// candidate sections. Match failure is a valid outcome and yields an empty
/// string, never an error.
pub fn resolve(
    label: &str,
    rules: &ExpandedRules,
    sections: &SectionMap,
    full_text: &str,
) -> String {
    let default_rule;
    let rule = match rules.get(label) {
        Some(rule) => rule,
        None => {
            default_rule = synthesize_default_rule(label);
            &default_rule
        }
    };

    let candidates = candidate_sections(rule, sections, full_text);

    match rule.kind {
        RuleKind::SingleLine => {
            first_match(&candidates, &rule.search, single_line_value).unwrap_or_default()
        }
        RuleKind::MultiLine => {
            first_match(&candidates, &rule.search, multi_line_value).unwrap_or_default()
        }
        RuleKind::Paragraph => first_n_sentences(
            candidates[0],
            rule.keep_n_sentences.unwrap_or(DEFAULT_KEEP_SENTENCES),
        ),
        RuleKind::Regex => rule
            .pattern
            .as_deref()
            .and_then(|pattern| regex_value(pattern, full_text, &candidates))
            .unwrap_or_default(),
    }
}

/// Best-effort fallback for labels with no configured rule: a single-line
/// rule whose sole search variant is the label with underscores replaced by
/// spaces. Guarantees every schema label is attempted even without explicit
/// configuration.
pub fn synthesize_default_rule(label: &str) -> ConcreteRule {
    ConcreteRule {
        search: vec![label.replace('_', " ")],
        kind: RuleKind::SingleLine,
        pattern: None,
        keep_n_sentences: None,
        row: None,
    }
}

/// Sections whose name matches any search variant (case-insensitive regex
/// search, not full match), in insertion order. An empty result falls back to
/// a single candidate holding the entire document text.
fn candidate_sections<'a>(
    rule: &ConcreteRule,
    sections: &'a SectionMap,
    full_text: &'a str,
) -> Vec<&'a str> {
    let mut candidates: Vec<&str> = sections
        .iter()
        .filter(|section| {
            rule.search
                .iter()
                .any(|variant| variant_matches_name(variant, &section.name))
        })
        .map(|section| section.body.as_str())
        .collect();
    if candidates.is_empty() {
        candidates.push(full_text);
    }
    candidates
}

fn variant_matches_name(variant: &str, name: &str) -> bool {
    // Variants are validated to compile at rule-load time; a synthesized
    // default variant is plain label text, so failures only mean no match.
    RegexBuilder::new(variant)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// The ordered first-match search: candidate sections outer, search variants
/// inner, first non-empty value wins and short-circuits both loops. Within
/// one section every variant is tried before moving to the next section.
fn first_match<F>(candidates: &[&str], variants: &[String], strategy: F) -> Option<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    for section in candidates {
        for variant in variants {
            if let Some(value) = strategy(section, variant) {
                return Some(value);
            }
        }
    }
    None
}

/// Anchor on the variant followed by optional colon/whitespace, then capture
/// up to 200 characters non-greedily, stopping at two consecutive spaces, a
/// newline, or end of text.
fn single_line_value(section: &str, variant: &str) -> Option<String> {
    let pattern = format!(
        r"(?i){}[:\s]*([^\n]{{1,{}}}?)(?:\s\s|\n|$)",
        regex::escape(variant),
        SINGLE_LINE_CAPTURE_LIMIT
    );
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(section)?;
    let value = captures[1].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Same anchor as single_line, but the capture spans lines: it stops at the
/// next header-like line, a blank line, or end of text, and internal line
/// breaks collapse to single spaces.
fn multi_line_value(section: &str, variant: &str) -> Option<String> {
    let anchor = Regex::new(&format!(r"(?i){}[:\s]*", regex::escape(variant))).ok()?;
    let found = anchor.find(section)?;
    let rest = &section[found.end()..];

    let mut parts: Vec<&str> = Vec::new();
    for (i, line) in rest.lines().enumerate() {
        let trimmed = line.trim();
        // The first line is the remainder of the anchor line; it may be
        // empty when the anchor sits at the end of its line.
        if i > 0 && (trimmed.is_empty() || is_header_line(line)) {
            break;
        }
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    let value = parts.join(" ");
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Apply the rule's explicit pattern against the full document text first;
/// only if that yields nothing, try each candidate section in order. A
/// fallback candidate that is the full text itself is skipped, it was
/// already searched.
fn regex_value(pattern: &str, full_text: &str, candidates: &[&str]) -> Option<String> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .ok()?;

    std::iter::once(full_text)
        .chain(
            candidates
                .iter()
                .copied()
                .filter(|candidate| !std::ptr::eq(*candidate, full_text)),
        )
        .find_map(|haystack| {
            let captures = re.captures(haystack)?;
            let value = captures.get(1)?.as_str().trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        })
}

/// Split into sentence units on terminal punctuation followed by whitespace
/// and an upper-case letter; join the first `n` units with single spaces.
pub fn first_n_sentences(text: &str, n: usize) -> String {
    let text = text.trim();
    if text.is_empty() || n == 0 {
        return String::new();
    }

    let mut sentences: Vec<&str> = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // punctuation is single-byte, the capital is where the next unit starts
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end() - 1;
        if sentences.len() == n {
            break;
        }
    }
    if sentences.len() < n {
        sentences.push(&text[start..]);
    }
    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::rules::expander::expand_wildcards;
    use crate::sectionizer::sectionize;

    fn rules_from_yaml(yaml: &str) -> ExpandedRules {
        let config = ExtractionConfig::from_yaml_str(yaml, "test").unwrap();
        expand_wildcards(&config.templates, config.max_repeat)
    }

    #[test]
    fn single_line_stops_at_double_space() {
        let rules = rules_from_yaml(
            r#"
dob:
  search: ["DOB"]
  type: single_line
"#,
        );
        let text = "DEMOGRAPHICS:\nDOB: 01/02/1950  Next field";
        let sections = sectionize(text);
        // "DOB" doesn't match any section name, so the full text is searched
        assert_eq!(resolve("dob", &rules, &sections, text), "01/02/1950");
    }

    #[test]
    fn variants_are_tried_in_order_within_a_section() {
        let rules = rules_from_yaml(
            r#"
dob:
  search: ["date of birth", "DOB"]
  type: single_line
"#,
        );
        let text = "INTAKE:\nDOB: 01/02/1950\ndate of birth: 03/04/1960";
        let sections = sectionize(text);
        // first variant wins even though the second appears earlier in text
        assert_eq!(resolve("dob", &rules, &sections, text), "03/04/1960");
    }

    #[test]
    fn candidate_sections_searched_in_insertion_order() {
        let rules = rules_from_yaml(
            r#"
note:
  search: ["notes"]
  type: single_line
"#,
        );
        let text = "NURSE NOTES:\nnotes: from nurse\nDOCTOR NOTES:\nnotes: from doctor";
        let sections = sectionize(text);
        assert_eq!(resolve("note", &rules, &sections, text), "from nurse");
    }

    #[test]
    fn unconfigured_label_uses_synthesized_default_rule() {
        let rules = ExpandedRules::default();
        let text = "SUMMARY:\nasm date: 05/06/2024\n";
        let sections = sectionize(text);
        assert_eq!(resolve("asm_date", &rules, &sections, text), "05/06/2024");
    }

    #[test]
    fn unmatched_label_resolves_to_empty_string() {
        let rules = ExpandedRules::default();
        let text = "SUMMARY:\nnothing of interest here";
        let sections = sectionize(text);
        assert_eq!(resolve("k_allergy", &rules, &sections, text), "");
    }

    #[test]
    fn paragraph_keeps_first_n_sentences() {
        let rules = rules_from_yaml(
            r#"
a_sect_comments:
  search: ["comments"]
  type: paragraph
  keep_n_sentences: 2
"#,
        );
        let text =
            "COMMENTS:\nPatient is stable. No complaints today. Further history follows.";
        let sections = sectionize(text);
        assert_eq!(
            resolve("a_sect_comments", &rules, &sections, text),
            "Patient is stable. No complaints today."
        );
    }

    #[test]
    fn paragraph_defaults_to_two_sentences() {
        assert_eq!(
            first_n_sentences("One here. Two here. Three here.", DEFAULT_KEEP_SENTENCES),
            "One here. Two here."
        );
    }

    #[test]
    fn first_n_sentences_handles_fewer_sentences_than_requested() {
        assert_eq!(first_n_sentences("Only one sentence.", 5), "Only one sentence.");
        assert_eq!(first_n_sentences("", 2), "");
    }

    #[test]
    fn sentence_split_requires_capital_after_punctuation() {
        // "v. smith" is not a boundary, no capital follows
        assert_eq!(
            first_n_sentences("Seen by Dr. v. smith today. Stable now. More.", 1),
            "Seen by Dr. v. smith today."
        );
    }

    #[test]
    fn multi_line_collapses_line_breaks_and_stops_at_blank_line() {
        let rules = rules_from_yaml(
            r#"
a_lvarr:
  search: ["living"]
  type: multi_line
"#,
        );
        let text = "LIVING ARRANGEMENT:\nliving: alone in a\nsecond floor apartment\n\nunrelated trailing text";
        let sections = sectionize(text);
        assert_eq!(
            resolve("a_lvarr", &rules, &sections, text),
            "alone in a second floor apartment"
        );
    }

    #[test]
    fn multi_line_stops_at_header_like_line() {
        let rules = rules_from_yaml(
            r#"
note:
  search: ["history"]
  type: multi_line
"#,
        );
        let text = "history: ongoing fatigue\nworse at night\nNEXT SECTION:\nignored";
        let sections = sectionize(text);
        assert_eq!(
            resolve("note", &rules, &sections, text),
            "ongoing fatigue worse at night"
        );
    }

    #[test]
    fn regex_tries_full_document_before_candidate_sections() {
        let rules = rules_from_yaml(
            r#"
cin:
  search: ["identifiers"]
  type: regex
  pattern: 'CIN[:\s]+([A-Z]{2}\d{5})'
"#,
        );
        // the CIN sits outside the matching "identifiers" section
        let text = "Header CIN: AB12345\nIDENTIFIERS:\nno cin here";
        let sections = sectionize(text);
        assert_eq!(resolve("cin", &rules, &sections, text), "AB12345");
    }

    #[test]
    fn regex_falls_back_to_candidate_sections() {
        let rules = rules_from_yaml(
            r#"
cin:
  search: ["identifiers"]
  type: regex
  pattern: 'CIN[:\s]+([A-Z]{2}\d{5})'
"#,
        );
        let text = "IDENTIFIERS:\nCIN: AB12345";
        let sections = sectionize(text);
        assert_eq!(resolve("cin", &rules, &sections, text), "AB12345");
    }

    #[test]
    fn regex_without_matching_section_resolves_from_full_text() {
        let rules = rules_from_yaml(
            r#"
cin:
  search: ["identifiers"]
  type: regex
  pattern: 'CIN[:\s]+([A-Z]{2}\d{5})'
"#,
        );
        // no section matches "identifiers": the fallback candidate is the
        // document itself and must not shadow the full-text pass
        let text = "NOTES:\nCIN: AB12345";
        let sections = sectionize(text);
        assert_eq!(resolve("cin", &rules, &sections, text), "AB12345");
        assert_eq!(resolve("cin", &rules, &sections, "no match here"), "");
    }

    #[test]
    fn default_rule_replaces_underscores_with_spaces() {
        let rule = synthesize_default_rule("caregiver_assist");
        assert_eq!(rule.search, ["caregiver assist"]);
        assert_eq!(rule.kind, RuleKind::SingleLine);
        assert_eq!(rule.row, None);
    }
}
