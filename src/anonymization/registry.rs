//! Field transformation registry
//!
//! Static table mapping every recognized field name to the strategy applied
//! to it. The table is fixed; callers can't register or override strategies.
//!
//! | Field | Strategy |
//! |---|---|
//! | firstname, lastname, street, streetName | [`FieldStrategy::PartialMask`] |
//! | phone | [`FieldStrategy::PartialMaskSuffix`] |
//! | zipcode | [`FieldStrategy::PartialMaskPrefix`] |
//! | latitude, longitude, buildingNumber | [`FieldStrategy::FullMask`] |
//! | birthday | [`FieldStrategy::GeneralizeToDecade`] |
//! | email | [`FieldStrategy::EmailIdentity`] |
//! | city, gender, country | [`FieldStrategy::Unchanged`] |

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// Replacement for a fully masked value
pub const FULL_MASK: &str = "****";

/// Suffix appended after the preserved first character
pub const PARTIAL_MASK_SUFFIX: &str = "***";

/// Suffix appended after the preserved first zipcode character
pub const ZIPCODE_MASK_SUFFIX: &str = "****";

/// Label for birthdays that can't be generalized
pub const UNKNOWN_AGE_GROUP: &str = "Unknown";

/// Number of trailing phone characters left visible
const PHONE_VISIBLE_SUFFIX: usize = 3;

const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// Transformation strategy for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStrategy {
    /// First character followed by `***`
    PartialMask,
    /// `*` for every character except the last three
    PartialMaskSuffix,
    /// First character followed by `****`
    PartialMaskPrefix,
    /// Always `****`
    FullMask,
    /// Decade-of-age bucket such as `[30-40]`
    GeneralizeToDecade,
    /// `****@domain`, plus identity derivation by the engine
    EmailIdentity,
    /// Never transformed
    Unchanged,
}

impl FieldStrategy {
    /// Short label used in reports and audit entries
    pub fn label(&self) -> &'static str {
        match self {
            Self::PartialMask => "partial_mask",
            Self::PartialMaskSuffix => "partial_mask_suffix",
            Self::PartialMaskPrefix => "partial_mask_prefix",
            Self::FullMask => "full_mask",
            Self::GeneralizeToDecade => "generalize_to_decade",
            Self::EmailIdentity => "email_identity",
            Self::Unchanged => "unchanged",
        }
    }
}

/// The field policy
pub const FIELD_POLICY: &[(&str, FieldStrategy)] = &[
    ("firstname", FieldStrategy::PartialMask),
    ("lastname", FieldStrategy::PartialMask),
    ("street", FieldStrategy::PartialMask),
    ("streetName", FieldStrategy::PartialMask),
    ("phone", FieldStrategy::PartialMaskSuffix),
    ("zipcode", FieldStrategy::PartialMaskPrefix),
    ("latitude", FieldStrategy::FullMask),
    ("longitude", FieldStrategy::FullMask),
    ("buildingNumber", FieldStrategy::FullMask),
    ("birthday", FieldStrategy::GeneralizeToDecade),
    ("email", FieldStrategy::EmailIdentity),
    ("city", FieldStrategy::Unchanged),
    ("gender", FieldStrategy::Unchanged),
    ("country", FieldStrategy::Unchanged),
];

/// Looks up the strategy declared for a field
pub fn strategy_for(field: &str) -> Option<FieldStrategy> {
    FIELD_POLICY
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, strategy)| *strategy)
}

/// Applies the declared transformation using the current calendar year
///
/// Undeclared fields are returned unchanged.
pub fn transform(field: &str, value: &Value) -> Value {
    transform_at(field, value, Utc::now().year())
}

/// Applies the declared transformation against a fixed reference year
pub fn transform_at(field: &str, value: &Value, reference_year: i32) -> Value {
    match strategy_for(field) {
        Some(strategy) => apply(strategy, value, reference_year),
        None => value.clone(),
    }
}

/// Applies one strategy to a value
pub fn apply(strategy: FieldStrategy, value: &Value, reference_year: i32) -> Value {
    let text = value.as_str();
    let masked = match strategy {
        FieldStrategy::PartialMask => partial_mask(text),
        FieldStrategy::PartialMaskSuffix => partial_mask_suffix(text),
        FieldStrategy::PartialMaskPrefix => partial_mask_prefix(text),
        FieldStrategy::FullMask => FULL_MASK.to_string(),
        FieldStrategy::GeneralizeToDecade => generalize_birthday(text, reference_year),
        FieldStrategy::EmailIdentity => mask_email(text),
        FieldStrategy::Unchanged => return value.clone(),
    };
    Value::String(masked)
}

/// First character plus `***`; anything but a non-empty string becomes `****`
pub fn partial_mask(value: Option<&str>) -> String {
    match value.and_then(|v| v.chars().next()) {
        Some(first) => format!("{first}{PARTIAL_MASK_SUFFIX}"),
        None => FULL_MASK.to_string(),
    }
}

/// Masks all but the last three characters; shorter input becomes `****`
pub fn partial_mask_suffix(value: Option<&str>) -> String {
    let Some(value) = value else {
        return FULL_MASK.to_string();
    };
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < PHONE_VISIBLE_SUFFIX {
        return FULL_MASK.to_string();
    }
    let hidden = chars.len() - PHONE_VISIBLE_SUFFIX;
    let visible: String = chars[hidden..].iter().collect();
    format!("{}{visible}", "*".repeat(hidden))
}

/// First character plus `****`; anything but a non-empty string becomes `****`
pub fn partial_mask_prefix(value: Option<&str>) -> String {
    match value.and_then(|v| v.chars().next()) {
        Some(first) => format!("{first}{ZIPCODE_MASK_SUFFIX}"),
        None => FULL_MASK.to_string(),
    }
}

/// `****@domain` when the value has exactly one `@`, `****` otherwise
///
/// Applying it to its own output yields the same output.
pub fn mask_email(value: Option<&str>) -> String {
    let Some(value) = value else {
        return FULL_MASK.to_string();
    };
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_local), Some(domain), None) => format!("{FULL_MASK}@{domain}"),
        _ => FULL_MASK.to_string(),
    }
}

/// Decade bucket of the age reached in `reference_year`
///
/// Missing, empty or unparsable values become `Unknown`.
pub fn generalize_birthday(value: Option<&str>, reference_year: i32) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return UNKNOWN_AGE_GROUP.to_string();
    };
    match NaiveDate::parse_from_str(value, BIRTHDAY_FORMAT) {
        Ok(date) => {
            let age = reference_year - date.year();
            let lower = age.div_euclid(10) * 10;
            format!("[{lower}-{}]", lower + 10)
        }
        Err(_) => UNKNOWN_AGE_GROUP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_policy_entry_resolves() {
        for (field, strategy) in FIELD_POLICY {
            assert_eq!(strategy_for(field), Some(*strategy));
        }
        assert_eq!(strategy_for("website"), None);
    }

    #[test]
    fn test_partial_mask() {
        assert_eq!(partial_mask(Some("Anna")), "A***");
        assert_eq!(partial_mask(Some("Ö")), "Ö***");
        assert_eq!(partial_mask(Some("")), "****");
        assert_eq!(partial_mask(None), "****");
    }

    #[test]
    fn test_phone_mask() {
        assert_eq!(partial_mask_suffix(Some("1234567")), "****567");
        assert_eq!(partial_mask_suffix(Some("123")), "123");
        assert_eq!(partial_mask_suffix(Some("12")), "****");
        assert_eq!(partial_mask_suffix(None), "****");
    }

    #[test]
    fn test_zipcode_mask() {
        assert_eq!(partial_mask_prefix(Some("12345")), "1****");
        assert_eq!(partial_mask_prefix(Some("")), "****");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email(Some("test@gmail.com")), "****@gmail.com");
        assert_eq!(mask_email(Some("no-at-sign")), "****");
        assert_eq!(mask_email(Some("a@b@c")), "****");
        assert_eq!(mask_email(None), "****");
    }

    #[test]
    fn test_mask_email_is_stable() {
        let once = mask_email(Some("anna@example.com"));
        let twice = mask_email(Some(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_generalize_birthday() {
        assert_eq!(generalize_birthday(Some("1990-05-01"), 2024), "[30-40]");
        assert_eq!(generalize_birthday(Some("2020-01-01"), 2024), "[0-10]");
        assert_eq!(generalize_birthday(Some("1990/05/01"), 2024), "Unknown");
        assert_eq!(generalize_birthday(Some(""), 2024), "Unknown");
        assert_eq!(generalize_birthday(None, 2024), "Unknown");
    }

    #[test]
    fn test_transform_full_mask_any_type() {
        assert_eq!(transform_at("latitude", &json!(52.52), 2024), json!("****"));
        assert_eq!(transform_at("buildingNumber", &json!("12a"), 2024), json!("****"));
    }

    #[test]
    fn test_transform_non_string_partial_mask() {
        assert_eq!(transform_at("firstname", &json!(42), 2024), json!("****"));
        assert_eq!(transform_at("phone", &Value::Null, 2024), json!("****"));
    }

    #[test]
    fn test_transform_unchanged_and_undeclared() {
        assert_eq!(transform_at("city", &json!("Berlin"), 2024), json!("Berlin"));
        assert_eq!(transform_at("gender", &json!("female"), 2024), json!("female"));
        assert_eq!(
            transform_at("website", &json!("http://x"), 2024),
            json!("http://x")
        );
    }

    #[test]
    fn test_transform_birthday_against_current_year() {
        let birth_year = Utc::now().year() - 34;
        let value = json!(format!("{birth_year}-06-15"));

        assert_eq!(transform("birthday", &value), json!("[30-40]"));
        assert_eq!(transform("birthday", &json!("15/06/1990")), json!("Unknown"));
    }
}
