//! Attribute data supplied by the holder for a single disclosure request

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZkidError};

/// Validated private attributes of a holder.
///
/// Nothing in here ever leaves the prover: the verifier only sees the
/// commitment and the public inputs.
#[derive(Clone, PartialEq, Eq)]
pub struct AttributeSet {
    /// Full name
    pub name: String,

    /// Nationality
    pub nation: String,

    /// Postal address
    pub address: String,

    /// Age in years; the value compared against the policy threshold
    pub age: u64,

    /// Identity document number
    pub identity_id: u64,

    /// Opaque attribute bytes (e.g. a biometric template)
    pub attr_value: Vec<u8>,
}

impl AttributeSet {
    /// Create a new attribute set
    pub fn new(
        name: impl Into<String>,
        nation: impl Into<String>,
        address: impl Into<String>,
        age: u64,
        identity_id: u64,
        attr_value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            nation: nation.into(),
            address: address.into(),
            age,
            identity_id,
            attr_value: attr_value.into(),
        }
    }

    /// Parse attributes from the JSON form of [`RawAttributes`]
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawAttributes = serde_json::from_str(json)
            .map_err(|e| ZkidError::PreprocessingError(format!("Invalid attribute JSON: {}", e)))?;
        Self::try_from(raw)
    }

    /// Render attributes back into their JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&RawAttributes::from(self))?)
    }
}

// Attribute values are private; keep them out of logs and panic messages.
impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSet")
            .field("name", &"<redacted>")
            .field("nation", &"<redacted>")
            .field("address", &"<redacted>")
            .field("age", &"<redacted>")
            .field("identity_id", &"<redacted>")
            .field("attr_value", &format_args!("<{} bytes>", self.attr_value.len()))
            .finish()
    }
}

/// Wire form of an attribute set as it arrives from files or callers.
///
/// `attr_value` is hex so that malformed bytes can be reported as a
/// preprocessing error. Negative or fractional integers fail to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttributes {
    pub name: String,
    pub nation: String,
    pub address: String,
    pub age: u64,
    pub identity_id: u64,
    /// Hex string, optional `0x` prefix
    pub attr_value: String,
}

impl TryFrom<RawAttributes> for AttributeSet {
    type Error = ZkidError;

    fn try_from(raw: RawAttributes) -> Result<Self> {
        let hex_str = raw.attr_value.strip_prefix("0x").unwrap_or(&raw.attr_value);
        let attr_value = hex::decode(hex_str).map_err(|e| {
            ZkidError::PreprocessingError(format!("attr_value is not valid hex: {}", e))
        })?;

        Ok(Self {
            name: raw.name,
            nation: raw.nation,
            address: raw.address,
            age: raw.age,
            identity_id: raw.identity_id,
            attr_value,
        })
    }
}

impl From<&AttributeSet> for RawAttributes {
    fn from(attrs: &AttributeSet) -> Self {
        Self {
            name: attrs.name.clone(),
            nation: attrs.nation.clone(),
            address: attrs.address.clone(),
            age: attrs.age,
            identity_id: attrs.identity_id,
            attr_value: format!("0x{}", hex::encode(&attrs.attr_value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_JSON: &str = r#"{
        "name": "Alice",
        "nation": "Wonderland",
        "address": "123 Fantasy Rd",
        "age": 28,
        "identity_id": 123456789,
        "attr_value": "0x01020304"
    }"#;

    #[test]
    fn test_parse_attributes_json() {
        let attrs = AttributeSet::from_json(ALICE_JSON).unwrap();
        assert_eq!(attrs.name, "Alice");
        assert_eq!(attrs.age, 28);
        assert_eq!(attrs.identity_id, 123456789);
        assert_eq!(attrs.attr_value, vec![1u8, 2, 3, 4]);
    }

    #[test]
    fn test_json_roundtrip() {
        let attrs = AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4]);
        let json = attrs.to_json().unwrap();
        assert_eq!(AttributeSet::from_json(&json).unwrap(), attrs);
    }

    #[test]
    fn test_negative_age_rejected() {
        let json = ALICE_JSON.replace("\"age\": 28", "\"age\": -1");
        let err = AttributeSet::from_json(&json).unwrap_err();
        assert!(matches!(err, ZkidError::PreprocessingError(_)));
        assert!(err.to_string().contains("-1"));

        let json = ALICE_JSON.replace("123456789", "-123456789");
        assert!(matches!(AttributeSet::from_json(&json), Err(ZkidError::PreprocessingError(_))));
    }

    #[test]
    fn test_json_roundtrip_full_u64_range() {
        let attrs = AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", u64::MAX, u64::MAX, Vec::<u8>::new());
        let json = attrs.to_json().unwrap();
        assert!(json.contains("18446744073709551615"));
        assert_eq!(AttributeSet::from_json(&json).unwrap(), attrs);
    }

    #[test]
    fn test_bad_hex_rejected() {
        let json = ALICE_JSON.replace("0x01020304", "0xzz");
        let err = AttributeSet::from_json(&json).unwrap_err();
        assert!(matches!(err, ZkidError::PreprocessingError(_)));
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = AttributeSet::from_json(r#"{"name": "Alice"}"#).unwrap_err();
        assert!(matches!(err, ZkidError::PreprocessingError(_)));
    }

    #[test]
    fn test_debug_redacts_values() {
        let attrs = AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4]);
        let rendered = format!("{:?}", attrs);
        assert!(!rendered.contains("Alice"));
        assert!(!rendered.contains("123456789"));
        assert!(rendered.contains("<4 bytes>"));
    }
}
