//! Address flattening
//!
//! The upstream API nests location data under `address`. The store keeps it
//! as top-level columns, so the sub-object is lifted before anonymization:
//! `{"address": {"city": "Berlin"}}` becomes `{"city": "Berlin"}`.

use crate::domain::RawRecord;

/// Lift the known sub-fields of a nested `address` object to the top level
///
/// See [`RawRecord::flatten_address`].
pub fn flatten_address(record: RawRecord) -> RawRecord {
    record.flatten_address()
}

/// Flatten every record of a batch
pub fn standardize(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records.into_iter().map(flatten_address).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_flatten_full_address() {
        let flat = flatten_address(record(json!({
            "firstname": "Anna",
            "address": {
                "id": 0,
                "street": "Main St 1",
                "streetName": "Main St",
                "buildingNumber": "1",
                "city": "Berlin",
                "zipcode": "10115",
                "country": "Germany",
                "county_code": "DE",
                "latitude": 52.52,
                "longitude": 13.40
            }
        })));

        assert!(!flat.contains("address"));
        assert!(!flat.contains("county_code"));
        assert_eq!(flat.get("city"), Some(&json!("Berlin")));
        assert_eq!(flat.get("latitude"), Some(&json!(52.52)));
        assert_eq!(flat.get("firstname"), Some(&json!("Anna")));
        assert_eq!(flat.len(), 9);
    }

    #[test]
    fn test_flatten_partial_address() {
        let flat = flatten_address(record(json!({
            "address": {"city": "Paris"}
        })));

        assert_eq!(flat.get("city"), Some(&json!("Paris")));
        assert!(!flat.contains("zipcode"));
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn test_non_object_address_untouched() {
        let input = record(json!({"address": "somewhere", "email": "a@b.c"}));
        assert_eq!(flatten_address(input.clone()), input);
    }

    #[test]
    fn test_no_address() {
        let input = record(json!({"email": "a@b.c"}));
        assert_eq!(flatten_address(input.clone()), input);
    }

    #[test]
    fn test_standardize_batch() {
        let out = standardize(vec![
            record(json!({"address": {"zipcode": "1"}})),
            record(json!({"address": {"zipcode": "2"}})),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].get("zipcode"), Some(&json!("2")));
    }
}
