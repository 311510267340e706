//! Canonical JSON encoding.
//!
//! A report must hash identically no matter which producer serialized it,
//! so digests are always taken over a canonical byte encoding: object keys
//! sorted, no insignificant whitespace.
//!
//! `serde_json::Value` objects are backed by a `BTreeMap` (this workspace
//! does not enable the `preserve_order` feature), so serialization is
//! already key-sorted; compact output is serde_json's default. The
//! functions here exist to give that contract a name and a test.

use serde_json::Value;

use attestor_core::error::Result;

/// Serializes a JSON value to canonical bytes.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Serializes a JSON value to a canonical string.
pub fn canonical_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_are_sorted() {
        let value: Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": {"b": 1, "a": 2}}"#).unwrap();
        let canonical = canonical_string(&value).unwrap();
        assert_eq!(canonical, r#"{"alpha":2,"mid":{"a":2,"b":1},"zeta":1}"#);
    }

    #[test]
    fn test_output_is_compact() {
        let value = json!({"company": "Acme", "score": 87.5, "answers": [1, 2, 3]});
        let canonical = canonical_string(&value).unwrap();
        assert!(!canonical.contains(": "));
        assert!(!canonical.contains(", "));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": 2, "x": 1}"#).unwrap();
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn test_array_order_is_preserved() {
        let value = json!(["b", "a"]);
        assert_eq!(canonical_string(&value).unwrap(), r#"["b","a"]"#);
    }
}
