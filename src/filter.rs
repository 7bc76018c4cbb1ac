//! The filter engine: derives the visible subset from the canonical list.

use crate::normalize;
use crate::record::ContactRecord;

/// A group or subgroup criterion: the wildcard, or an exact match against
/// the normalized field value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Any,
    Only(String),
}

impl Selection {
    pub fn only(value: &str) -> Self {
        Self::Only(normalize::clean(value))
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::Any => true,
            Selection::Only(wanted) => value == wanted,
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Selection::Only(_))
    }

    pub fn as_concrete(&self) -> Option<&str> {
        match self {
            Selection::Any => None,
            Selection::Only(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub group: Selection,
    pub subgroup: Selection,
    pub query: String,
}

/// Stable filter: returns indices into `records`, in input order. A record
/// must satisfy group, subgroup, and query simultaneously; an empty query
/// always passes.
pub fn filter(
    records: &[ContactRecord],
    criteria: &FilterCriteria,
    include_phone_links: bool,
) -> Vec<usize> {
    let query = normalize::normalize_query(&criteria.query);
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            criteria.group.matches(&record.group)
                && criteria.subgroup.matches(&record.subgroup)
                && query
                    .as_deref()
                    .map_or(true, |q| record.haystack(include_phone_links).contains(q))
        })
        .map(|(index, _)| index)
        .collect()
}

/// Batch export is offered only for a concrete group and subgroup selection
/// that actually matched something. Recomputed on every filter run.
pub fn export_enabled(criteria: &FilterCriteria, subset_len: usize) -> bool {
    criteria.group.is_concrete() && criteria.subgroup.is_concrete() && subset_len > 0
}
