//! The record store: sole owner of the canonical contact list.
//!
//! Records are created once, in bulk, when the data file is parsed at
//! startup; they are never updated or deleted for the life of the process.
//! Filtering and sorting operate on derived index views, never on this list.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::collate;
use crate::record::{ContactRecord, RawRecord};

/// The single failure class: the data file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<ContactRecord>,
}

impl RecordStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and parse the data file, normalizing every record at import.
    /// A malformed record field is not an error; malformed JSON is.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let raw_records: Vec<RawRecord> =
            serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_raw(raw_records))
    }

    pub fn from_raw(raw: Vec<RawRecord>) -> Self {
        Self {
            records: raw.into_iter().map(ContactRecord::from_raw).collect(),
        }
    }

    pub fn records(&self) -> &[ContactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-empty groups, in collation order.
    pub fn groups(&self) -> Vec<String> {
        uniq_sorted(self.records.iter().map(|r| r.group.clone()))
    }

    /// Distinct non-empty subgroups among records of `group`, or among all
    /// records when `group` is `None`, in collation order.
    pub fn subgroups(&self, group: Option<&str>) -> Vec<String> {
        uniq_sorted(
            self.records
                .iter()
                .filter(|r| group.map_or(true, |g| r.group == g))
                .map(|r| r.subgroup.clone()),
        )
    }
}

fn uniq_sorted(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.filter(|v| !v.is_empty()).collect();
    out.sort_by(|a, b| collate::compare(a, b));
    out.dedup();
    out
}
