//! vCard 4.0 serialization.
//!
//! The export format is a fixed subset (N, FN, TEL, NOTE) with a
//! contractual line layout, so the cards are assembled directly rather than
//! through a generator that owns folding and property order. A record is
//! either fully present in the output or absent; there is no partial write.

use crate::record::ContactRecord;

/// RFC 6350 text-value escaping: backslash, comma, semicolon, newline.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// The NOTE line carries the labeled unit fields; only non-empty segments
/// are emitted, and the line is omitted when all three are empty.
fn note_line(record: &ContactRecord) -> Option<String> {
    let mut parts = Vec::new();
    if !record.group.is_empty() {
        parts.push(format!("פלוגה: {}", escape_text(&record.group)));
    }
    if !record.subgroup.is_empty() {
        parts.push(format!("מסגרת: {}", escape_text(&record.subgroup)));
    }
    if !record.role.is_empty() {
        parts.push(format!("תפקיד: {}", escape_text(&record.role)));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("NOTE:{}", parts.join(" | ")))
    }
}

/// Serialize one record as a single vCard 4.0 block, newline-joined, no
/// trailing newline.
pub fn to_vcard(record: &ContactRecord) -> String {
    let mut lines = Vec::with_capacity(7);
    lines.push("BEGIN:VCARD".to_string());
    lines.push("VERSION:4.0".to_string());
    lines.push(format!(
        "N:{};{};;;",
        escape_text(&record.last_name),
        escape_text(&record.first_name)
    ));
    let full_name = format!("{} {}", record.first_name, record.last_name);
    lines.push(format!("FN:{}", escape_text(full_name.trim())));
    if !record.mobile_phone_link.is_empty() {
        lines.push(format!("TEL;TYPE=cell:{}", record.mobile_phone_link));
    }
    if let Some(note) = note_line(record) {
        lines.push(note);
    }
    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

/// Concatenate blocks for a batch export; blocks are newline-joined with no
/// separator blank line, contiguous with single-record serialization.
pub fn to_vcard_batch<'a>(records: impl IntoIterator<Item = &'a ContactRecord>) -> String {
    records
        .into_iter()
        .map(to_vcard)
        .collect::<Vec<_>>()
        .join("\n")
}
