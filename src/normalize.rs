//! Field-value normalization.
//!
//! Source values arrive copy-pasted from RTL documents and carry invisible
//! bidirectional formatting controls. Every field is normalized exactly once
//! at import; comparisons additionally case-fold.

/// Unicode bidirectional formatting controls: LRM/RLM, the embedding and
/// override range, and the isolate range.
fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

/// Strip bidi controls, then trim surrounding whitespace. Idempotent.
pub fn clean(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| !is_bidi_control(*c)).collect();
    stripped.trim().to_string()
}

/// `clean` for possibly-absent values; absent yields the empty string.
pub fn clean_opt(value: Option<&str>) -> String {
    value.map(clean).unwrap_or_default()
}

/// Case-folded `clean`, for order- and membership-insensitive comparisons.
/// Never used for display values.
pub fn clean_lower(value: &str) -> String {
    clean(value).to_lowercase()
}

/// Normalize a free-text query. An empty or whitespace-only query is no
/// criterion at all.
pub fn normalize_query(query: &str) -> Option<String> {
    let cleaned = clean_lower(query);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
