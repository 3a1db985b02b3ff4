//! Derived identifier binding all raw attributes into one field element
//!
//! `DID = Keccak256(name || nation || address || be(age) || be(identity_id) || attr_value)`
//! where `be` is the minimal big-endian encoding. There are no separators or
//! length prefixes; changing the serialization invalidates every DID and
//! commitment issued so far.

use std::fmt;
use std::str::FromStr;

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::{Result, ZkidError};
use crate::field::{from_decimal, minimal_be_bytes, to_decimal, FieldElement};
use crate::identity::types::AttributeSet;

/// Decentralised identifier derived from an [`AttributeSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(FieldElement);

impl Did {
    pub fn from_field(value: FieldElement) -> Self {
        Self(value)
    }

    pub fn as_field(&self) -> FieldElement {
        self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal(&self.0))
    }
}

impl FromStr for Did {
    type Err = ZkidError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(from_decimal(s)?))
    }
}

impl TryFrom<String> for Did {
    type Error = ZkidError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

/// Byte string the DID digest is taken over
pub fn did_preimage(attrs: &AttributeSet) -> Vec<u8> {
    let mut preimage = Vec::with_capacity(
        attrs.name.len() + attrs.nation.len() + attrs.address.len() + 16 + attrs.attr_value.len(),
    );
    preimage.extend_from_slice(attrs.name.as_bytes());
    preimage.extend_from_slice(attrs.nation.as_bytes());
    preimage.extend_from_slice(attrs.address.as_bytes());
    preimage.extend_from_slice(&minimal_be_bytes(attrs.age));
    preimage.extend_from_slice(&minimal_be_bytes(attrs.identity_id));
    preimage.extend_from_slice(&attrs.attr_value);
    preimage
}

/// Compute the DID for a set of attributes
pub fn compute_did(attrs: &AttributeSet) -> Did {
    let digest = Keccak256::digest(did_preimage(attrs));
    let did = Did(FieldElement::from_be_bytes_mod_order(&digest));
    log::debug!("Computed DID: {}", did);
    did
}

/// Recompute the DID and compare it with one supplied by a third party
pub fn check_did(attrs: &AttributeSet, supplied: &Did) -> Result<Did> {
    let computed = compute_did(attrs);
    if &computed != supplied {
        log::warn!("DID mismatch: supplied {}, computed {}", supplied, computed);
        return Err(ZkidError::ConsistencyError(format!(
            "supplied DID {} does not match attributes (computed {})",
            supplied, computed
        )));
    }
    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    #[test]
    fn test_did_is_deterministic() {
        assert_eq!(compute_did(&alice()), compute_did(&alice()));
    }

    #[test]
    fn test_preimage_layout() {
        let mut expected = b"AliceWonderland123 Fantasy Rd".to_vec();
        expected.push(28);
        expected.extend_from_slice(&[0x07, 0x5b, 0xcd, 0x15]);
        expected.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(did_preimage(&alice()), expected);
    }

    #[test]
    fn test_zero_integers_contribute_no_bytes() {
        let attrs = AttributeSet::new("a", "b", "c", 0, 0, Vec::<u8>::new());
        assert_eq!(did_preimage(&attrs), b"abc".to_vec());
    }

    #[test]
    fn test_did_changes_with_attributes() {
        let base = compute_did(&alice());

        let mut older = alice();
        older.age = 29;
        assert_ne!(compute_did(&older), base);

        let mut renamed = alice();
        renamed.name = "Alicia".to_string();
        assert_ne!(compute_did(&renamed), base);
    }

    #[test]
    fn test_check_did() {
        let did = compute_did(&alice());
        assert_eq!(check_did(&alice(), &did).unwrap(), did);

        let wrong = Did::from_field(did.as_field() + FieldElement::from(1u64));
        let err = check_did(&alice(), &wrong).unwrap_err();
        assert!(matches!(err, ZkidError::ConsistencyError(_)));
    }

    #[test]
    fn test_did_text_and_serde() {
        let did = compute_did(&alice());
        let parsed: Did = did.to_string().parse().unwrap();
        assert_eq!(parsed, did);

        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, format!("\"{}\"", did));
        let back: Did = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
    }
}
