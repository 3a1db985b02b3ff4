//! Deterministic mapping of raw attributes onto circuit signals.
//!
//! Strings, the identity number and the opaque attribute bytes are replaced by
//! their Keccak-256 digest reduced into the field. Age is the one exception: it
//! is compared against the threshold inside the circuit, and a digest would
//! destroy its ordering, so it is carried as the raw integer.
//!
//! No blinding is applied; the same attributes always encode the same way.

use crate::field::{keccak_to_field, minimal_be_bytes, FieldElement};
use crate::identity::types::AttributeSet;

/// Field-element encoding of an [`AttributeSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedAttributes {
    pub name: FieldElement,
    pub age: FieldElement,
    pub nation: FieldElement,
    pub address: FieldElement,
    pub identity_id: FieldElement,
    pub attr_value: FieldElement,
    raw_age: u64,
}

impl EncodedAttributes {
    /// The age as supplied, before it was lifted into the field
    pub fn raw_age(&self) -> u64 {
        self.raw_age
    }
}

/// Encode every attribute as a field element
pub fn encode_attributes(attrs: &AttributeSet) -> EncodedAttributes {
    log::debug!("Encoding attributes into field elements");

    EncodedAttributes {
        name: keccak_to_field(attrs.name.as_bytes()),
        age: FieldElement::from(attrs.age),
        nation: keccak_to_field(attrs.nation.as_bytes()),
        address: keccak_to_field(attrs.address.as_bytes()),
        identity_id: keccak_to_field(&minimal_be_bytes(attrs.identity_id)),
        attr_value: keccak_to_field(&attrs.attr_value),
        raw_age: attrs.age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode_attributes(&alice()), encode_attributes(&alice()));
    }

    #[test]
    fn test_age_is_not_hashed() {
        let encoded = encode_attributes(&alice());
        assert_eq!(encoded.age, FieldElement::from(28u64));
        assert_eq!(encoded.raw_age(), 28);
    }

    #[test]
    fn test_hashed_fields() {
        let encoded = encode_attributes(&alice());
        assert_eq!(encoded.name, keccak_to_field(b"Alice"));
        assert_eq!(encoded.identity_id, keccak_to_field(&[0x07, 0x5b, 0xcd, 0x15]));
        assert_eq!(encoded.attr_value, keccak_to_field(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_each_field_changes_its_encoding() {
        let base = encode_attributes(&alice());

        let mut other = alice();
        other.nation = "Looking Glass".to_string();
        assert_ne!(encode_attributes(&other).nation, base.nation);

        let mut other = alice();
        other.attr_value = vec![4, 3, 2, 1];
        assert_ne!(encode_attributes(&other).attr_value, base.attr_value);

        let mut other = alice();
        other.identity_id += 1;
        assert_ne!(encode_attributes(&other).identity_id, base.identity_id);
    }
}
