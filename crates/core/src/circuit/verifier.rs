//! Proof verification for the attribute threshold circuit
//!
//! The verifier sees public inputs, the proof and the verifying key. It has
//! no path that accepts attribute data.

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey};
use ark_snark::SNARK;

use crate::circuit::config::CIRCUIT_ID;
use crate::circuit::layout::PUBLIC_SIGNALS;
use crate::circuit::witness::PublicInputs;
use crate::error::{Result, ZkidError};
use crate::field::FieldElement;
use crate::keys::{current_fingerprint, KeyStore, ProofBytes, VerifyingKeyBytes};
use crate::presentation::Presentation;

/// Verifies proofs against one ceremony's verifying key
#[derive(Clone)]
pub struct VerifierService {
    pvk: PreparedVerifyingKey<Bn254>,
    vk_hash: String,
}

impl VerifierService {
    pub fn new(vk: VerifyingKeyBytes) -> Result<Self> {
        let key = vk.open(&current_fingerprint()?)?;

        let inputs = key.gamma_abc_g1.len().saturating_sub(1);
        if inputs != PUBLIC_SIGNALS.len() {
            return Err(ZkidError::ConfigurationError(format!(
                "verifying key expects {} public inputs, layout has {}",
                inputs,
                PUBLIC_SIGNALS.len()
            )));
        }

        let pvk = <Groth16<Bn254> as SNARK<FieldElement>>::process_vk(&key)
            .map_err(|e| ZkidError::KeyIoError(format!("cannot prepare verifying key: {}", e)))?;

        log::info!("✓ Loaded verifying key {}", vk.vk_hash_hex());
        Ok(Self {
            pvk,
            vk_hash: vk.vk_hash_hex(),
        })
    }

    pub fn from_store(store: &dyn KeyStore) -> Result<Self> {
        Self::new(store.verifying_key(CIRCUIT_ID)?)
    }

    pub fn vk_hash(&self) -> &str {
        &self.vk_hash
    }

    /// Verify a proof against the ordered public inputs.
    ///
    /// Returns `Ok(false)` for any proof that is rejected, including bytes
    /// that do not decode to curve points.
    pub fn verify(&self, public_inputs: &PublicInputs, proof: &ProofBytes) -> Result<bool> {
        self.verify_field_elements(&public_inputs.to_field_elements(), proof)
    }

    /// Verify against a raw public-input vector.
    ///
    /// A vector of the wrong length is a [`ZkidError::ConfigurationError`].
    pub fn verify_field_elements(&self, public_inputs: &[FieldElement], proof: &ProofBytes) -> Result<bool> {
        if public_inputs.len() != PUBLIC_SIGNALS.len() {
            return Err(ZkidError::ConfigurationError(format!(
                "expected {} public inputs, got {}",
                PUBLIC_SIGNALS.len(),
                public_inputs.len()
            )));
        }

        let proof = match proof.decode() {
            Ok(proof) => proof,
            Err(e) => {
                log::warn!("Proof rejected: {}", e);
                return Ok(false);
            }
        };

        let valid = <Groth16<Bn254> as SNARK<FieldElement>>::verify_with_processed_vk(
            &self.pvk,
            public_inputs,
            &proof,
        )
        .map_err(|e| ZkidError::ConfigurationError(format!("verification setup: {}", e)))?;

        if valid {
            log::info!("✓ Proof verified");
        } else {
            log::warn!("Proof rejected by pairing check");
        }
        Ok(valid)
    }

    /// Verify public inputs given as canonical decimal strings
    pub fn verify_decimal_strings(&self, public_inputs: &[String], proof: &ProofBytes) -> Result<bool> {
        self.verify(&PublicInputs::from_decimal_strings(public_inputs)?, proof)
    }

    /// Like [`verify`](Self::verify), but a rejected proof is an error
    pub fn ensure_valid(&self, public_inputs: &PublicInputs, proof: &ProofBytes) -> Result<()> {
        if self.verify(public_inputs, proof)? {
            Ok(())
        } else {
            Err(ZkidError::VerificationFailure(format!(
                "proof does not verify for policy {} version {} threshold {}",
                public_inputs.policy_id, public_inputs.version, public_inputs.threshold
            )))
        }
    }

    /// Check a presentation's envelope, then verify its proof
    pub fn verify_presentation(&self, presentation: &Presentation) -> Result<bool> {
        presentation.check_envelope(&self.vk_hash)?;
        let public_inputs = presentation.public_inputs()?;
        let proof = presentation.decode_proof()?;
        self.verify(&public_inputs, &proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MemoryKeyStore;

    #[test]
    fn test_missing_key() {
        let store = MemoryKeyStore::new();
        let err = VerifierService::from_store(&store).err().unwrap();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
    }

    #[test]
    fn test_garbage_key_rejected() {
        let err = VerifierService::new(VerifyingKeyBytes::from_bytes(vec![0u8; 16]))
            .err()
            .unwrap();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
    }
}
