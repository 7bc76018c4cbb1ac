//! File emission for vCard exports.
//!
//! Filenames derive deterministically from record or selection names, with
//! filesystem-unsafe characters replaced and the stem length capped. Writes
//! go through a temporary sibling file so a partial `.vcf` is never
//! observable; the temporary is removed on the error path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::Date;

use crate::collate;
use crate::record::ContactRecord;

/// Longest allowed filename stem. Keeps derived names inside common
/// filesystem path limits.
pub const MAX_STEM_LEN: usize = 100;

const FALLBACK_STEM: &str = "contact";

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || collate::is_hebrew(c)
}

/// Replace unsafe characters with `_`, collapse runs, trim, cap the length.
/// Empty input falls back to a fixed stem so a filename always exists.
pub fn safe_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_gap = false;
    for c in value.chars() {
        if is_safe_char(c) {
            if pending_gap && !out.is_empty() {
                out.push('_');
            }
            pending_gap = false;
            out.push(c);
        } else {
            pending_gap = true;
        }
    }
    let capped: String = out.chars().take(MAX_STEM_LEN).collect();
    if capped.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        capped
    }
}

/// Stem for a single-record export: `<first>_<last>`.
pub fn single_stem(record: &ContactRecord) -> String {
    safe_name(&format!("{} {}", record.first_name, record.last_name))
}

/// Stem for a batch export: `Pluga_<group>_<subgroup>_<yyyymmdd>`. The date
/// suffix keeps repeated exports collision-resistant across days.
pub fn batch_stem(group: &str, subgroup: &str, date: Date) -> String {
    let stamp = format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    );
    safe_name(&format!("Pluga {} {} {}", group, subgroup, stamp))
}

/// Write `content` to `dir/filename` through a temporary sibling, renaming
/// into place only once the full content is on disk.
pub fn save_vcard(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let target = dir.join(filename);
    let tmp = dir.join(format!("{filename}.tmp"));
    let written = fs::write(&tmp, content.as_bytes()).and_then(|()| fs::rename(&tmp, &target));
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp);
        return Err(source).with_context(|| format!("failed to write {}", target.display()));
    }
    Ok(target)
}
