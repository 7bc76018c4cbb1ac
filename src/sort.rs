//! The sort engine: orders the filtered view by a selected column.

use crate::collate;
use crate::record::ContactRecord;

/// Sortable columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    FirstName,
    LastName,
    Group,
    Subgroup,
    Role,
    Mobile,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::FirstName,
        SortKey::LastName,
        SortKey::Group,
        SortKey::Subgroup,
        SortKey::Role,
        SortKey::Mobile,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SortKey::FirstName => "שם פרטי",
            SortKey::LastName => "שם משפחה",
            SortKey::Group => "פלוגה",
            SortKey::Subgroup => "מסגרת",
            SortKey::Role => "תפקיד",
            SortKey::Mobile => "טלפון",
        }
    }

    pub fn digit(self) -> char {
        match self {
            SortKey::FirstName => '1',
            SortKey::LastName => '2',
            SortKey::Group => '3',
            SortKey::Subgroup => '4',
            SortKey::Role => '5',
            SortKey::Mobile => '6',
        }
    }

    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(SortKey::FirstName),
            '2' => Some(SortKey::LastName),
            '3' => Some(SortKey::Group),
            '4' => Some(SortKey::Subgroup),
            '5' => Some(SortKey::Role),
            '6' => Some(SortKey::Mobile),
            _ => None,
        }
    }

    pub fn value(self, record: &ContactRecord) -> &str {
        match self {
            SortKey::FirstName => &record.first_name,
            SortKey::LastName => &record.last_name,
            SortKey::Group => &record.group,
            SortKey::Subgroup => &record.subgroup,
            SortKey::Role => &record.role,
            SortKey::Mobile => &record.mobile_display,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Stable sort of the filtered view. Ties on the primary key always break
/// by last name then first name, ascending, regardless of the primary
/// direction.
pub fn sort(records: &[ContactRecord], view: &mut [usize], key: SortKey, direction: SortDirection) {
    view.sort_by(|&a, &b| {
        let ra = &records[a];
        let rb = &records[b];
        let primary = collate::compare(key.value(ra), key.value(rb));
        let primary = match direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary
            .then_with(|| collate::compare(&ra.last_name, &rb.last_name))
            .then_with(|| collate::compare(&ra.first_name, &rb.first_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn records() -> Vec<ContactRecord> {
        let raw: Vec<RawRecord> = serde_json::from_str(
            r#"[
                {"firstName":"גל","lastName":"מזרחי","role":"חובש"},
                {"firstName":"אבי","lastName":"לוי","role":"סמל"},
                {"firstName":"דנה","lastName":"כהן","role":"סמל"},
                {"firstName":"בני","lastName":"כהן","role":"סמל"}
            ]"#,
        )
        .unwrap();
        raw.into_iter().map(ContactRecord::from_raw).collect()
    }

    fn sorted_view(key: SortKey, direction: SortDirection) -> Vec<usize> {
        let records = records();
        let mut view: Vec<usize> = (0..records.len()).collect();
        sort(&records, &mut view, key, direction);
        view
    }

    #[test]
    fn test_sort_by_last_name_ascending() {
        // כהן < לוי < מזרחי; the two כהן tie-break on first name (בני < דנה)
        assert_eq!(
            sorted_view(SortKey::LastName, SortDirection::Ascending),
            vec![3, 2, 1, 0]
        );
    }

    #[test]
    fn test_descending_reverses_primary_only() {
        assert_eq!(
            sorted_view(SortKey::LastName, SortDirection::Descending),
            vec![0, 1, 3, 2]
        );
    }

    #[test]
    fn test_tiebreak_ignores_primary_direction() {
        // Sorting by role: three records share "סמל"; they must order by
        // (last, first) ascending in both directions.
        let ascending = sorted_view(SortKey::Role, SortDirection::Ascending);
        let descending = sorted_view(SortKey::Role, SortDirection::Descending);
        assert_eq!(ascending, vec![0, 3, 2, 1]);
        assert_eq!(descending, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_direction_toggle() {
        assert_eq!(
            SortDirection::Ascending.toggled(),
            SortDirection::Descending
        );
        assert_eq!(
            SortDirection::Ascending.toggled().toggled(),
            SortDirection::Ascending
        );
    }

    #[test]
    fn test_sort_does_not_touch_the_store() {
        let records = records();
        let before = records.clone();
        let mut view: Vec<usize> = (0..records.len()).collect();
        sort(&records, &mut view, SortKey::FirstName, SortDirection::Descending);
        assert_eq!(records, before);
    }
}
