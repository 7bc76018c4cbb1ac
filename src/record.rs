//! The contact record and its raw source shape.

use serde::Deserialize;

use crate::normalize;

/// One element of the source JSON array, in the producer's field names.
/// Every field tolerates absent or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub pluga: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default, rename = "mobileE164")]
    pub mobile_e164: Option<String>,
    #[serde(default, rename = "mobileWA")]
    pub mobile_wa: Option<String>,
}

/// One person. All fields are normalized exactly once, here, and the record
/// is immutable afterwards; a record with every field empty is legal and
/// renders as blank cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub first_name: String,
    pub last_name: String,
    /// Top-level organizational unit ("pluga").
    pub group: String,
    /// Unit nested under `group` ("framework").
    pub subgroup: String,
    pub role: String,
    /// Human-formatted phone string, display only.
    pub mobile_display: String,
    /// E.164 number, used for tel links and the vCard TEL line.
    pub mobile_phone_link: String,
    /// Number formatted for the wa.me deep link.
    pub mobile_messaging_link: String,
}

impl ContactRecord {
    pub fn from_raw(raw: RawRecord) -> Self {
        Self {
            first_name: normalize::clean_opt(raw.first_name.as_deref()),
            last_name: normalize::clean_opt(raw.last_name.as_deref()),
            group: normalize::clean_opt(raw.pluga.as_deref()),
            subgroup: normalize::clean_opt(raw.framework.as_deref()),
            role: normalize::clean_opt(raw.role.as_deref()),
            mobile_display: normalize::clean_opt(raw.mobile.as_deref()),
            mobile_phone_link: normalize::clean_opt(raw.mobile_e164.as_deref()),
            mobile_messaging_link: normalize::clean_opt(raw.mobile_wa.as_deref()),
        }
    }

    /// Space-joined, case-folded text the free-text query is matched
    /// against. The phone-link fields join in only when configured.
    pub fn haystack(&self, include_phone_links: bool) -> String {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.role.as_str(),
            self.group.as_str(),
            self.subgroup.as_str(),
            self.mobile_display.as_str(),
        ];
        if include_phone_links {
            fields.push(self.mobile_phone_link.as_str());
            fields.push(self.mobile_messaging_link.as_str());
        }
        normalize::clean_lower(&fields.join(" "))
    }
}
