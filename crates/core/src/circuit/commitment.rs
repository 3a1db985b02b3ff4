//! Public commitment over the policy binding and the encoded attributes
//!
//! ```text
//! C = Poseidon(policy_id, version, H(name), age, H(nation), H(address),
//!              H(identity_id), H(attr_value), did)
//! ```
//!
//! The preimage is assembled from [`COMMITMENT_PREIMAGE`] and hashed with the
//! parameters from [`poseidon_config`], exactly as the circuit does it. Any
//! divergence between the two makes honest proofs unprovable.

use std::fmt;
use std::str::FromStr;

use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::Zero;
use serde::{Deserialize, Serialize};

use crate::circuit::config::poseidon_config;
use crate::circuit::layout::{PreimageElement, COMMITMENT_PREIMAGE, PRIVATE_SIGNALS, PrivateSignal};
use crate::error::{Result, ZkidError};
use crate::field::{from_decimal, to_decimal, FieldElement};
use crate::identity::{encode_attributes, AttributeSet, Did, EncodedAttributes};

/// Public commitment to a holder's attributes under one policy version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commitment(FieldElement);

impl Commitment {
    pub fn from_field(value: FieldElement) -> Self {
        Self(value)
    }

    pub fn as_field(&self) -> FieldElement {
        self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal(&self.0))
    }
}

impl FromStr for Commitment {
    type Err = ZkidError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(from_decimal(s)?))
    }
}

impl TryFrom<String> for Commitment {
    type Error = ZkidError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Commitment> for String {
    fn from(commitment: Commitment) -> Self {
        commitment.to_string()
    }
}

/// Private signal values in [`PRIVATE_SIGNALS`] order
pub fn private_signal_values(encoded: &EncodedAttributes, did: &Did) -> [FieldElement; 7] {
    PRIVATE_SIGNALS.map(|signal| match signal {
        PrivateSignal::Name => encoded.name,
        PrivateSignal::Age => encoded.age,
        PrivateSignal::Nation => encoded.nation,
        PrivateSignal::Address => encoded.address,
        PrivateSignal::IdentityId => encoded.identity_id,
        PrivateSignal::AttrValue => encoded.attr_value,
        PrivateSignal::Did => did.as_field(),
    })
}

/// Arrange public and private signals into commitment preimage order.
///
/// Generic so the circuit can reuse it over allocated variables.
pub fn arrange_preimage<T: Clone>(public: &[T], private: &[T]) -> Vec<T> {
    COMMITMENT_PREIMAGE
        .iter()
        .map(|element| match element {
            PreimageElement::Public(signal) => public[signal.index()].clone(),
            PreimageElement::Private(signal) => private[signal.index()].clone(),
        })
        .collect()
}

/// Native evaluation of the circuit hash
pub fn circuit_hash(inputs: &[FieldElement]) -> FieldElement {
    let mut sponge = PoseidonSponge::<FieldElement>::new(poseidon_config());
    sponge.absorb(&inputs.to_vec());
    sponge
        .squeeze_native_field_elements(1)
        .pop()
        .unwrap_or_else(FieldElement::zero)
}

/// Compute the commitment from already encoded attributes
pub fn commitment_from_encoded(
    policy_id: u64,
    version: u64,
    encoded: &EncodedAttributes,
    did: &Did,
) -> Commitment {
    // Commitment and threshold are not part of the preimage; their slots stay zero.
    let public = [
        FieldElement::from(policy_id),
        FieldElement::from(version),
        FieldElement::zero(),
        FieldElement::zero(),
    ];
    let private = private_signal_values(encoded, did);
    Commitment(circuit_hash(&arrange_preimage(&public, &private)))
}

/// Compute the public commitment for a set of attributes
pub fn compute_commitment(policy_id: u64, version: u64, attrs: &AttributeSet, did: &Did) -> Commitment {
    log::debug!("Computing commitment for policy {} version {}", policy_id, version);

    let encoded = encode_attributes(attrs);
    let commitment = commitment_from_encoded(policy_id, version, &encoded, did);

    log::debug!("Commitment computed: {}", commitment);
    commitment
}

/// Recompute the commitment and compare it with a supplied one
pub fn check_commitment(
    policy_id: u64,
    version: u64,
    attrs: &AttributeSet,
    did: &Did,
    supplied: &Commitment,
) -> Result<Commitment> {
    let computed = compute_commitment(policy_id, version, attrs, did);
    if &computed != supplied {
        log::warn!("Commitment mismatch for policy {} version {}", policy_id, version);
        return Err(ZkidError::ConsistencyError(format!(
            "supplied commitment {} does not match attributes (computed {})",
            supplied, computed
        )));
    }
    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::compute_did;

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    #[test]
    fn test_compute_commitment() {
        let attrs = alice();
        let did = compute_did(&attrs);

        let c1 = compute_commitment(1, 1, &attrs, &did);
        let c2 = compute_commitment(1, 1, &attrs, &did);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_commitment_binds_policy_and_version() {
        let attrs = alice();
        let did = compute_did(&attrs);

        let base = compute_commitment(1, 1, &attrs, &did);
        assert_ne!(base, compute_commitment(2, 1, &attrs, &did));
        assert_ne!(base, compute_commitment(1, 2, &attrs, &did));
        // Swapping policy and version must not collide either.
        assert_ne!(compute_commitment(1, 2, &attrs, &did), compute_commitment(2, 1, &attrs, &did));
    }

    #[test]
    fn test_commitment_changes_with_data() {
        let attrs = alice();
        let did = compute_did(&attrs);
        let base = compute_commitment(1, 1, &attrs, &did);

        let mut older = alice();
        older.age = 29;
        assert_ne!(base, compute_commitment(1, 1, &older, &did));

        let other_did = Did::from_field(did.as_field() + FieldElement::from(1u64));
        assert_ne!(base, compute_commitment(1, 1, &attrs, &other_did));
    }

    #[test]
    fn test_preimage_order() {
        let encoded = encode_attributes(&alice());
        let did = compute_did(&alice());
        let public = [
            FieldElement::from(7u64),
            FieldElement::from(3u64),
            FieldElement::zero(),
            FieldElement::zero(),
        ];
        let preimage = arrange_preimage(&public, &private_signal_values(&encoded, &did));

        assert_eq!(
            preimage,
            vec![
                FieldElement::from(7u64),
                FieldElement::from(3u64),
                encoded.name,
                FieldElement::from(28u64),
                encoded.nation,
                encoded.address,
                encoded.identity_id,
                encoded.attr_value,
                did.as_field(),
            ]
        );
    }

    #[test]
    fn test_check_commitment() {
        let attrs = alice();
        let did = compute_did(&attrs);
        let commitment = compute_commitment(1, 1, &attrs, &did);

        assert!(check_commitment(1, 1, &attrs, &did, &commitment).is_ok());
        let err = check_commitment(1, 2, &attrs, &did, &commitment).unwrap_err();
        assert!(matches!(err, ZkidError::ConsistencyError(_)));
    }

    #[test]
    fn test_commitment_text_roundtrip() {
        let attrs = alice();
        let did = compute_did(&attrs);
        let commitment = compute_commitment(1, 1, &attrs, &did);
        let parsed: Commitment = commitment.to_string().parse().unwrap();
        assert_eq!(parsed, commitment);
    }
}
