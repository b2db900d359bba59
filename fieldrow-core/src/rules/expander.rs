use crate::types::{ConcreteRule, RuleTemplate, WILDCARD_MARKER};
use std::collections::HashMap;

/// Concrete rules in expansion order, with by-label lookup.
///
/// Order is deterministic: template declaration order, and within a wildcard
/// family, index order (1..=max_repeat). A concrete-label collision keeps the
/// first occurrence's position but takes the later rule's definition
/// (last-write-wins, load order = declaration order).
#[derive(Debug, Clone, Default)]
pub struct ExpandedRules {
    ordered: Vec<(String, ConcreteRule)>,
    index: HashMap<String, usize>,
}

impl ExpandedRules {
    fn insert(&mut self, label: String, rule: ConcreteRule) {
        match self.index.get(&label) {
            Some(&position) => self.ordered[position].1 = rule,
            None => {
                self.index.insert(label.clone(), self.ordered.len());
                self.ordered.push((label, rule));
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&ConcreteRule> {
        self.index.get(label).map(|&position| &self.ordered[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConcreteRule)> {
        self.ordered.iter().map(|(l, r)| (l.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Expand rule templates into concrete, indexed rules.
///
/// A label pattern containing the wildcard marker emits `max_repeat` concrete
/// rules, one per 1-based index, each carrying the derived zero-based `row`.
/// Other templates pass through unchanged with no row attribute.
pub fn expand_wildcards(
    templates: &[(String, RuleTemplate)],
    max_repeat: usize,
) -> ExpandedRules {
    let mut rules = ExpandedRules::default();
    for (label_pattern, template) in templates {
        if label_pattern.contains(WILDCARD_MARKER) {
            for i in 1..=max_repeat {
                let label = label_pattern.replace(WILDCARD_MARKER, &i.to_string());
                rules.insert(label, ConcreteRule::from_template(template, Some(i - 1)));
            }
        } else {
            rules.insert(
                label_pattern.clone(),
                ConcreteRule::from_template(template, None),
            );
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleKind;

    fn template(search: &[&str]) -> RuleTemplate {
        RuleTemplate {
            search: search.iter().map(|s| (*s).to_string()).collect(),
            kind: RuleKind::SingleLine,
            pattern: None,
            keep_n_sentences: None,
        }
    }

    #[test]
    fn wildcard_template_expands_to_max_repeat_rules() {
        let templates = vec![("ma_drug*".to_string(), template(&["medication"]))];
        let rules = expand_wildcards(&templates, 5);

        assert_eq!(rules.len(), 5);
        let labels: Vec<&str> = rules.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["ma_drug1", "ma_drug2", "ma_drug3", "ma_drug4", "ma_drug5"]);
        for (i, (_, rule)) in rules.iter().enumerate() {
            assert_eq!(rule.row, Some(i));
        }
    }

    #[test]
    fn plain_template_passes_through_without_row() {
        let templates = vec![("dob".to_string(), template(&["DOB"]))];
        let rules = expand_wildcards(&templates, 30);

        assert_eq!(rules.len(), 1);
        let rule = rules.get("dob").unwrap();
        assert_eq!(rule.row, None);
        assert_eq!(rule.search, ["DOB"]);
    }

    #[test]
    fn collision_is_last_write_wins_keeping_first_position() {
        let templates = vec![
            ("dob".to_string(), template(&["old"])),
            ("cin".to_string(), template(&["CIN"])),
            ("dob".to_string(), template(&["new"])),
        ];
        let rules = expand_wildcards(&templates, 30);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("dob").unwrap().search, ["new"]);
        let labels: Vec<&str> = rules.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["dob", "cin"]);
    }

    #[test]
    fn expansion_is_bounded_by_max_repeat() {
        let templates = vec![("p*".to_string(), template(&["problem"]))];
        let rules = expand_wildcards(&templates, 30);
        assert_eq!(rules.len(), 30);
        assert!(rules.get("p30").is_some());
        assert!(rules.get("p31").is_none());
        assert_eq!(rules.get("p30").unwrap().row, Some(29));
    }
}
