//! R1CS model of the attribute threshold predicate
//!
//! Public inputs are allocated in [`PUBLIC_SIGNALS`] order, private witnesses
//! in [`PRIVATE_SIGNALS`] order. Two constraints are enforced:
//!
//! 1. `Poseidon(COMMITMENT_PREIMAGE) == commitment`
//! 2. `threshold <= COMPARED_SIGNAL`
//!
//! There is no upper bound on the compared value.

use std::cmp::Ordering;

use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError};

use crate::circuit::commitment::arrange_preimage;
use crate::circuit::config::poseidon_config;
use crate::circuit::layout::{PublicSignal, COMPARED_SIGNAL, PRIVATE_SIGNALS, PUBLIC_SIGNALS};
use crate::circuit::witness::Witness;
use crate::error::{Result, ZkidError};
use crate::field::FieldElement;

/// Attribute threshold circuit over the BN254 scalar field
#[derive(Clone)]
pub struct AttributeCircuit {
    public: Option<[FieldElement; 4]>,
    private: Option<[FieldElement; 7]>,
    params: &'static PoseidonConfig<FieldElement>,
}

impl AttributeCircuit {
    /// Circuit without an assignment, used for compilation and key setup
    pub fn blank() -> Self {
        Self {
            public: None,
            private: None,
            params: poseidon_config(),
        }
    }

    pub fn from_witness(witness: &Witness) -> Self {
        Self {
            public: Some(witness.public_values()),
            private: Some(*witness.private_values()),
            params: poseidon_config(),
        }
    }
}

impl ConstraintSynthesizer<FieldElement> for AttributeCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<FieldElement>) -> std::result::Result<(), SynthesisError> {
        let public = PUBLIC_SIGNALS
            .iter()
            .map(|signal| {
                FpVar::<FieldElement>::new_input(cs.clone(), || {
                    self.public
                        .map(|values| values[signal.index()])
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let private = PRIVATE_SIGNALS
            .iter()
            .map(|signal| {
                FpVar::<FieldElement>::new_witness(cs.clone(), || {
                    self.private
                        .map(|values| values[signal.index()])
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // 1. commitment
        let preimage = arrange_preimage(&public, &private);
        let mut sponge = PoseidonSpongeVar::new(cs.clone(), self.params);
        sponge.absorb(&preimage)?;
        let digest = sponge.squeeze_field_elements(1)?;
        let commitment = &public[PublicSignal::Commitment.index()];
        for element in &digest {
            element.enforce_equal(commitment)?;
        }

        // 2. threshold <= compared value
        let threshold = &public[PublicSignal::Threshold.index()];
        let compared = &private[COMPARED_SIGNAL.index()];
        threshold.enforce_cmp(compared, Ordering::Less, true)?;

        Ok(())
    }
}

/// Evaluate the circuit on a concrete witness without proving.
///
/// Catches an unsatisfiable assignment before any cryptographic work.
pub fn check_constraints(witness: &Witness) -> Result<()> {
    let cs = ConstraintSystem::<FieldElement>::new_ref();
    AttributeCircuit::from_witness(witness)
        .generate_constraints(cs.clone())
        .map_err(|e| ZkidError::CompilationError(e.to_string()))?;

    let satisfied = cs
        .is_satisfied()
        .map_err(|e| ZkidError::CompilationError(e.to_string()))?;
    if !satisfied {
        let location = cs
            .which_is_unsatisfied()
            .map_err(|e| ZkidError::CompilationError(e.to_string()))?
            .unwrap_or_else(|| "unknown".to_string());
        log::warn!("Constraint system unsatisfied at {}", location);
        return Err(ZkidError::WitnessError(format!(
            "constraint system unsatisfied at {}",
            location
        )));
    }

    log::debug!("Witness satisfies {} constraints", cs.num_constraints());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::commitment::{compute_commitment, Commitment};
    use crate::circuit::witness::PublicInputs;
    use crate::identity::{compute_did, encode_attributes, AttributeSet};

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    fn witness(public: PublicInputs) -> Witness {
        let attrs = alice();
        Witness::new(public, &encode_attributes(&attrs), &compute_did(&attrs))
    }

    fn honest(threshold: u64) -> Witness {
        let attrs = alice();
        let did = compute_did(&attrs);
        witness(PublicInputs::new(1, 1, compute_commitment(1, 1, &attrs, &did), threshold))
    }

    fn satisfied(witness: &Witness) -> bool {
        let cs = ConstraintSystem::<FieldElement>::new_ref();
        AttributeCircuit::from_witness(witness)
            .generate_constraints(cs.clone())
            .unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_honest_witness_satisfies() {
        assert!(satisfied(&honest(18)));
        assert!(satisfied(&honest(28)));
        assert!(satisfied(&honest(0)));
    }

    #[test]
    fn test_threshold_above_compared_value() {
        assert!(!satisfied(&honest(29)));
        assert!(!satisfied(&honest(30)));

        let err = check_constraints(&honest(30)).unwrap_err();
        assert!(matches!(err, ZkidError::WitnessError(_)));
    }

    #[test]
    fn test_commitment_mismatch() {
        let forged = Commitment::from_field(FieldElement::from(12345u64));
        assert!(!satisfied(&witness(PublicInputs::new(1, 1, forged, 18))));

        // Honest commitment, wrong policy binding.
        let attrs = alice();
        let did = compute_did(&attrs);
        let commitment = compute_commitment(1, 1, &attrs, &did);
        assert!(!satisfied(&witness(PublicInputs::new(2, 1, commitment, 18))));
    }

    #[test]
    fn test_native_and_circuit_hash_agree() {
        // The commitment constraint holds exactly when the native builder agrees.
        assert!(check_constraints(&honest(18)).is_ok());
        assert!(honest(18).check().is_ok());
    }

    #[test]
    fn test_four_public_inputs() {
        let cs = ConstraintSystem::<FieldElement>::new_ref();
        AttributeCircuit::from_witness(&honest(18))
            .generate_constraints(cs.clone())
            .unwrap();
        // Instance variables include the constant one.
        assert_eq!(cs.num_instance_variables(), 1 + PUBLIC_SIGNALS.len());
    }

    #[test]
    fn test_blank_circuit_synthesises_in_setup_mode() {
        let cs = ConstraintSystem::<FieldElement>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        AttributeCircuit::blank().generate_constraints(cs.clone()).unwrap();
        assert_eq!(cs.num_instance_variables(), 1 + PUBLIC_SIGNALS.len());
        assert!(cs.num_constraints() > 0);
    }
}
