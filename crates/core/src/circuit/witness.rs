//! Public input vector and full witness assignment

use std::fmt;

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::circuit::commitment::{arrange_preimage, circuit_hash, private_signal_values, Commitment};
use crate::circuit::layout::{PublicSignal, COMPARED_SIGNAL, PUBLIC_SIGNALS};
use crate::error::{Result, ZkidError};
use crate::field::{from_decimal, to_decimal, FieldElement};
use crate::identity::{Did, EncodedAttributes};

/// Ordered public inputs: `(policy_id, version, commitment, threshold)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub policy_id: u64,
    pub version: u64,
    pub commitment: Commitment,
    pub threshold: u64,
}

impl PublicInputs {
    pub fn new(policy_id: u64, version: u64, commitment: Commitment, threshold: u64) -> Self {
        Self {
            policy_id,
            version,
            commitment,
            threshold,
        }
    }

    fn value(&self, signal: PublicSignal) -> FieldElement {
        match signal {
            PublicSignal::PolicyId => FieldElement::from(self.policy_id),
            PublicSignal::Version => FieldElement::from(self.version),
            PublicSignal::Commitment => self.commitment.as_field(),
            PublicSignal::Threshold => FieldElement::from(self.threshold),
        }
    }

    /// Field elements in declared public-input order
    pub fn to_field_elements(&self) -> [FieldElement; 4] {
        PUBLIC_SIGNALS.map(|signal| self.value(signal))
    }

    /// Canonical decimal strings in declared public-input order
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.to_field_elements().iter().map(to_decimal).collect()
    }

    /// Rebuild the vector from decimal strings in declared order.
    ///
    /// A wrong number of inputs is a layout problem, not a bad proof, and is
    /// reported as [`ZkidError::ConfigurationError`].
    pub fn from_decimal_strings(values: &[String]) -> Result<Self> {
        if values.len() != PUBLIC_SIGNALS.len() {
            return Err(ZkidError::ConfigurationError(format!(
                "expected {} public inputs, got {}",
                PUBLIC_SIGNALS.len(),
                values.len()
            )));
        }

        let mut elements = [FieldElement::from(0u64); 4];
        for (slot, text) in elements.iter_mut().zip(values) {
            *slot = from_decimal(text)?;
        }

        Ok(Self {
            policy_id: integer_signal(elements[PublicSignal::PolicyId.index()], PublicSignal::PolicyId)?,
            version: integer_signal(elements[PublicSignal::Version.index()], PublicSignal::Version)?,
            commitment: Commitment::from_field(elements[PublicSignal::Commitment.index()]),
            threshold: integer_signal(elements[PublicSignal::Threshold.index()], PublicSignal::Threshold)?,
        })
    }
}

fn integer_signal(value: FieldElement, signal: PublicSignal) -> Result<u64> {
    let limbs = value.into_bigint().0;
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return Err(ZkidError::InvalidInput(format!(
            "{} does not fit in 64 bits",
            signal.label()
        )));
    }
    Ok(limbs[0])
}

/// Full signal assignment for one proof
#[derive(Clone)]
pub struct Witness {
    public: PublicInputs,
    private: [FieldElement; 7],
}

impl Witness {
    pub fn new(public: PublicInputs, encoded: &EncodedAttributes, did: &Did) -> Self {
        log::debug!(
            "Building witness (age {}, threshold {})",
            encoded.raw_age(),
            public.threshold
        );
        Self {
            public,
            private: private_signal_values(encoded, did),
        }
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.public
    }

    pub fn public_values(&self) -> [FieldElement; 4] {
        self.public.to_field_elements()
    }

    pub fn private_values(&self) -> &[FieldElement; 7] {
        &self.private
    }

    /// Evaluate both circuit predicates natively and name the one that fails
    pub fn check(&self) -> Result<()> {
        let public = self.public_values();

        let compared = self.private[COMPARED_SIGNAL.index()];
        if compared < public[PublicSignal::Threshold.index()] {
            log::warn!("Witness rejected: {} below threshold", COMPARED_SIGNAL.label());
            return Err(ZkidError::WitnessError(format!(
                "{} is below threshold {}",
                COMPARED_SIGNAL.label(),
                self.public.threshold
            )));
        }

        let digest = circuit_hash(&arrange_preimage(&public, &self.private));
        if digest != public[PublicSignal::Commitment.index()] {
            log::warn!("Witness rejected: commitment preimage mismatch");
            return Err(ZkidError::WitnessError(
                "commitment preimage does not hash to the public commitment".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::commitment::compute_commitment;
    use crate::identity::{compute_did, encode_attributes, AttributeSet};

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    fn witness_for(threshold: u64) -> Witness {
        let attrs = alice();
        let did = compute_did(&attrs);
        let commitment = compute_commitment(1, 1, &attrs, &did);
        let public = PublicInputs::new(1, 1, commitment, threshold);
        Witness::new(public, &encode_attributes(&attrs), &did)
    }

    #[test]
    fn test_public_input_order() {
        let commitment = Commitment::from_field(FieldElement::from(99u64));
        let public = PublicInputs::new(1, 2, commitment, 18);
        assert_eq!(
            public.to_field_elements(),
            [
                FieldElement::from(1u64),
                FieldElement::from(2u64),
                FieldElement::from(99u64),
                FieldElement::from(18u64),
            ]
        );
        assert_eq!(public.to_decimal_strings(), vec!["1", "2", "99", "18"]);
    }

    #[test]
    fn test_decimal_strings_roundtrip() {
        let public = *witness_for(18).public_inputs();
        let strings = public.to_decimal_strings();
        assert_eq!(PublicInputs::from_decimal_strings(&strings).unwrap(), public);
    }

    #[test]
    fn test_wrong_arity_is_configuration_error() {
        let strings = vec!["1".to_string(), "1".to_string(), "5".to_string()];
        let err = PublicInputs::from_decimal_strings(&strings).unwrap_err();
        assert!(matches!(err, ZkidError::ConfigurationError(_)));
    }

    #[test]
    fn test_oversized_integer_rejected() {
        let strings = vec![
            "18446744073709551616".to_string(),
            "1".to_string(),
            "5".to_string(),
            "18".to_string(),
        ];
        let err = PublicInputs::from_decimal_strings(&strings).unwrap_err();
        assert!(matches!(err, ZkidError::InvalidInput(_)));
    }

    #[test]
    fn test_witness_satisfied() {
        assert!(witness_for(18).check().is_ok());
        // Equality is allowed.
        assert!(witness_for(28).check().is_ok());
    }

    #[test]
    fn test_threshold_above_age() {
        let err = witness_for(30).check().unwrap_err();
        assert!(matches!(err, ZkidError::WitnessError(_)));
        assert!(err.to_string().contains("below threshold"));
    }

    #[test]
    fn test_wrong_commitment() {
        let attrs = alice();
        let did = compute_did(&attrs);
        let commitment = compute_commitment(2, 1, &attrs, &did);
        let public = PublicInputs::new(1, 1, commitment, 18);
        let witness = Witness::new(public, &encode_attributes(&attrs), &did);

        let err = witness.check().unwrap_err();
        assert!(matches!(err, ZkidError::WitnessError(_)));
        assert!(err.to_string().contains("commitment"));
    }

    #[test]
    fn test_debug_redacts_private_values() {
        let rendered = format!("{:?}", witness_for(18));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_public_inputs_json() {
        let public = *witness_for(18).public_inputs();
        let json = serde_json::to_string(&public).unwrap();
        let back: PublicInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public);
    }
}
