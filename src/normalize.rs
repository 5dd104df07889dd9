//! Text-to-key transforms for establishment matching.
//!
//! Keys are uppercase, punctuation-free strings compared by equality only.
//! Malformed or empty input yields `None`, which keeps the record out of
//! any join keyed on that field instead of failing the run.

/// Whole-word street-type canonicalizations applied to address keys.
const STREET_SUFFIXES: &[(&str, &str)] = &[
    ("BOULEVARD", "BLVD"),
    ("AVENUE", "AVE"),
    ("STREET", "ST"),
    ("ROAD", "RD"),
];

/// Uppercase, drop everything outside `[A-Z0-9 ]`, collapse whitespace.
fn clean_text(raw: &str) -> String {
    let upper: String = raw
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    upper.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Business-name key. `None` when nothing survives cleaning.
pub fn name_key(raw: &str) -> Option<String> {
    let key = clean_text(raw);
    (!key.is_empty()).then_some(key)
}

/// Postal-code key: the first 5 digits of the leading digit run, so a
/// ZIP+4 like `10001-1234` keys as `10001`. `None` when the trimmed value
/// does not start with at least 5 digits.
pub fn zip_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let run = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    (run >= 5).then(|| trimmed[..5].to_string())
}

/// Street-address key from a building number and street name. Either part
/// may be absent and contributes an empty segment. Suffix abbreviations
/// apply per whole token, so `AVENUE ROAD` becomes `AVE RD` and a word
/// like `STREETER` is left alone.
pub fn address_key(building: Option<&str>, street: Option<&str>) -> Option<String> {
    let raw = format!("{} {}", building.unwrap_or(""), street.unwrap_or(""));
    let cleaned = clean_text(&raw);
    if cleaned.is_empty() {
        return None;
    }
    let canonical = cleaned
        .split(' ')
        .map(abbreviate)
        .collect::<Vec<_>>()
        .join(" ");
    Some(canonical)
}

fn abbreviate(token: &str) -> &str {
    STREET_SUFFIXES
        .iter()
        .find(|(long, _)| *long == token)
        .map(|(_, short)| *short)
        .unwrap_or(token)
}
