/// The two labels holding a person's name, often matched from a combined
/// "Last, First" value.
const SURNAME_LABEL: &str = "last";
const GIVEN_NAME_LABEL: &str = "first";

/// Normalize a resolved value. Applied to every value regardless of label.
///
/// The name labels get the comma-split treatment: when the raw match looks
/// like "Smith, John", the surname label keeps the left part and the
/// given-name label the right. Everything else just loses incidental space
/// padding.
pub fn postprocess(label: &str, value: &str) -> String {
    if label == SURNAME_LABEL || label == GIVEN_NAME_LABEL {
        if let Some((last, first)) = value.split_once(',') {
            let part = if label == SURNAME_LABEL { last } else { first };
            return part.trim().to_string();
        }
    }
    value.trim_matches(' ').to_string()
}
