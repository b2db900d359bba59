use crate::types::{SectionMap, PREAMBLE_SECTION};
use regex::Regex;
use std::sync::LazyLock;

// Header shape: word/space/comma/slash/parenthesis characters followed by a
// colon, with nothing else on the line.
static HEADER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w ,/()]+):\s*$").unwrap());

/// Split raw document text into named blocks keyed by detected header lines.
///
/// Line-by-line fold: a header line opens a new section (name lowercased);
/// every other line is appended verbatim to the section currently open. Text
/// before the first header accumulates under the reserved `_preamble` name.
/// Bodies are returned joined with newlines and trimmed.
pub fn sectionize(text: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut current_name = PREAMBLE_SECTION.to_string();
    let mut current_index: Option<usize> = None;

    for line in text.lines() {
        if let Some(name) = header_name(line) {
            current_name = name;
            current_index = Some(sections.begin_section(&current_name));
        } else {
            // Sections are created lazily so a document starting with a
            // header never gets an empty preamble entry.
            let index = match current_index {
                Some(index) => index,
                None => {
                    let index = sections.begin_section(&current_name);
                    current_index = Some(index);
                    index
                }
            };
            sections.append_line(index, line);
        }
    }

    sections.trim_bodies();
    sections
}

/// Whether this line would open a new section.
pub fn is_header_line(line: &str) -> bool {
    header_name(line).is_some()
}

fn header_name(line: &str) -> Option<String> {
    let captures = HEADER_SHAPE.captures(line)?;
    // The casing check runs over the whole line, trailing colon included.
    // A header with mixed casing (neither all-upper nor title-case) is NOT
    // treated as a header and falls into the open section's body, a known
    // fragility of the heuristic.
    if is_all_upper(line) || is_title_case(line) {
        Some(captures[1].to_lowercase())
    } else {
        None
    }
}

/// Python `str.isupper` semantics: at least one cased character, and no
/// lowercase cased characters.
fn is_all_upper(text: &str) -> bool {
    let mut has_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Python `str.istitle` semantics: uppercase letters only follow uncased
/// characters, lowercase letters only follow cased ones, and there is at
/// least one cased character.
fn is_title_case(text: &str) -> bool {
    let mut has_cased = false;
    let mut previous_cased = false;
    for ch in text.chars() {
        if ch.is_uppercase() {
            if previous_cased {
                return false;
            }
            has_cased = true;
            previous_cased = true;
        } else if ch.is_lowercase() {
            if !previous_cased {
                return false;
            }
            has_cased = true;
        } else {
            previous_cased = false;
        }
    }
    has_cased
}
