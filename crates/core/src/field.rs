//! BN254 scalar helpers shared by the identity and circuit modules.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use sha3::{Digest, Keccak256};

use crate::error::{Result, ZkidError};

/// Scalar field of BN254, the field every signal lives in.
pub type FieldElement = Fr;

/// Keccak-256 of `data`, read as a big-endian integer and reduced into the field.
pub fn keccak_to_field(data: &[u8]) -> FieldElement {
    let digest = Keccak256::digest(data);
    Fr::from_be_bytes_mod_order(&digest)
}

/// Canonical decimal rendering (`"0"` for zero, no leading zeros).
pub fn to_decimal(value: &FieldElement) -> String {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le()).to_string()
}

/// Parse a canonical decimal string. Values outside `[0, r)` are rejected
/// rather than reduced, so every element has exactly one textual form.
pub fn from_decimal(text: &str) -> Result<FieldElement> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZkidError::InvalidInput(format!(
            "Not a decimal field element: '{}'",
            text
        )));
    }
    if text.len() > 1 && text.starts_with('0') {
        return Err(ZkidError::InvalidInput(format!(
            "Leading zeros are not canonical: '{}'",
            text
        )));
    }

    let value: BigUint = text
        .parse()
        .map_err(|e| ZkidError::InvalidInput(format!("Invalid decimal '{}': {}", text, e)))?;
    let modulus = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le());
    if value >= modulus {
        return Err(ZkidError::InvalidInput(format!(
            "Value exceeds the BN254 scalar modulus: '{}'",
            text
        )));
    }

    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Minimal big-endian encoding of an unsigned integer: no leading zero
/// bytes, and zero encodes as the empty string.
pub fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}
