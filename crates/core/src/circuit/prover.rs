//! Proof generation for the attribute threshold circuit

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ark_bn254::Bn254;
use ark_groth16::Groth16;
use ark_snark::SNARK;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::circuit::commitment::{check_commitment, compute_commitment, Commitment};
use crate::circuit::config::CIRCUIT_ID;
use crate::circuit::model::{check_constraints, AttributeCircuit};
use crate::circuit::witness::{PublicInputs, Witness};
use crate::error::{Result, ZkidError};
use crate::field::FieldElement;
use crate::identity::{check_did, compute_did, encode_attributes, AttributeSet, Did};
use crate::keys::{current_fingerprint, KeyStore, ProofBytes};

/// Everything the holder supplies for one proof
#[derive(Debug, Clone)]
pub struct ProofRequest {
    pub attributes: AttributeSet,
    /// DID claimed for the attributes; recomputed before proving
    pub did: Did,
    /// Commitment claimed for the attributes; recomputed before proving
    pub commitment: Commitment,
    pub policy_id: u64,
    pub version: u64,
    pub threshold: u64,
}

impl ProofRequest {
    /// Build a request whose DID and commitment are derived from `attributes`
    pub fn derive(attributes: AttributeSet, policy_id: u64, version: u64, threshold: u64) -> Self {
        let did = compute_did(&attributes);
        let commitment = compute_commitment(policy_id, version, &attributes, &did);
        Self {
            attributes,
            did,
            commitment,
            policy_id,
            version,
            threshold,
        }
    }
}

/// Proof plus the ordered public inputs it was generated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOutput {
    #[serde(with = "proof_hex")]
    pub proof: ProofBytes,
    pub public_inputs: PublicInputs,
}

impl ProofOutput {
    pub fn public_field_elements(&self) -> [FieldElement; 4] {
        self.public_inputs.to_field_elements()
    }

    pub fn public_decimal_strings(&self) -> Vec<String> {
        self.public_inputs.to_decimal_strings()
    }
}

mod proof_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::keys::ProofBytes;

    pub fn serialize<S: Serializer>(proof: &ProofBytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(proof.as_bytes())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProofBytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(serde::de::Error::custom)?;
        Ok(ProofBytes::from_bytes(bytes))
    }
}

/// Generates proofs with keys from an injected [`KeyStore`]
#[derive(Clone)]
pub struct ProverService {
    store: Arc<dyn KeyStore>,
}

impl ProverService {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Generate a threshold proof
    ///
    /// The claimed DID and commitment are recomputed first and any mismatch
    /// aborts before cryptographic work. A witness that does not satisfy the
    /// circuit (for example an age below the threshold) yields
    /// [`ZkidError::WitnessError`], never a proof.
    ///
    /// # Example
    /// ```no_run
    /// use std::sync::Arc;
    /// use zkid_core::circuit::{ProofRequest, ProverService};
    /// use zkid_core::identity::AttributeSet;
    /// use zkid_core::keys::FileKeyStore;
    ///
    /// let attrs = AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4]);
    /// let prover = ProverService::new(Arc::new(FileKeyStore::new("keys")));
    /// let output = prover.prove(&ProofRequest::derive(attrs, 1, 1, 18))?;
    /// println!("Public inputs: {:?}", output.public_decimal_strings());
    /// # Ok::<(), zkid_core::error::ZkidError>(())
    /// ```
    pub fn prove(&self, request: &ProofRequest) -> Result<ProofOutput> {
        log::info!(
            "Generating proof for policy {} version {} threshold {}",
            request.policy_id,
            request.version,
            request.threshold
        );

        // Step 1: consistency of the claimed identifiers
        let did = check_did(&request.attributes, &request.did)?;
        check_commitment(
            request.policy_id,
            request.version,
            &request.attributes,
            &did,
            &request.commitment,
        )?;
        log::info!("✓ DID and commitment match the attributes");

        // Step 2: witness and constraint pre-check
        let public = PublicInputs::new(
            request.policy_id,
            request.version,
            request.commitment,
            request.threshold,
        );
        let witness = Witness::new(public, &encode_attributes(&request.attributes), &did);
        witness.check()?;
        check_constraints(&witness)?;
        log::info!("✓ Witness satisfies the circuit");

        // Step 3: proving key
        let pk = self
            .store
            .proving_key(CIRCUIT_ID)?
            .open(&current_fingerprint()?)?;
        log::info!("✓ Loaded proving key for {}", CIRCUIT_ID);

        // Step 4: prove
        log::info!("Generating proof (this may take a few seconds)...");
        let start = Instant::now();
        let circuit = AttributeCircuit::from_witness(&witness);
        let proof = <Groth16<Bn254> as SNARK<FieldElement>>::prove(&pk, circuit, &mut OsRng)
            .map_err(|e| ZkidError::Other(format!("Groth16 proving failed: {}", e)))?;
        log::info!("✓ Proof generated in {:.2?}", start.elapsed());

        let proof = ProofBytes::from_proof(&proof)?;
        log::info!("✓ Proof size: {} bytes", proof.len());

        Ok(ProofOutput {
            proof,
            public_inputs: public,
        })
    }

    /// Run [`prove`](Self::prove) on a worker thread with a deadline.
    ///
    /// On timeout the worker's result is discarded; the service never writes
    /// artifacts, so there is nothing partial to clean up.
    ///
    /// Groth16 proving cannot be interrupted, so a timed-out worker keeps
    /// running until its proof completes and only then exits. Callers that
    /// retry after a timeout should bound their own retries; each one adds a
    /// CPU-bound thread until the earlier workers finish.
    pub fn prove_with_timeout(&self, request: ProofRequest, timeout: Duration) -> Result<ProofOutput> {
        let service = self.clone();
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("zkid-prover".to_string())
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(service.prove(&request));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Proof generation exceeded {:?}", timeout);
                Err(ZkidError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ZkidError::Other(
                "prover thread exited without a result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MemoryKeyStore;

    fn alice() -> AttributeSet {
        AttributeSet::new("Alice", "Wonderland", "123 Fantasy Rd", 28, 123456789, vec![1u8, 2, 3, 4])
    }

    fn empty_prover() -> ProverService {
        ProverService::new(Arc::new(MemoryKeyStore::new()))
    }

    #[test]
    fn test_derive_request() {
        let request = ProofRequest::derive(alice(), 1, 1, 18);
        assert_eq!(request.did, compute_did(&alice()));
        assert_eq!(request.commitment, compute_commitment(1, 1, &alice(), &request.did));
    }

    #[test]
    fn test_did_mismatch_aborts() {
        let mut request = ProofRequest::derive(alice(), 1, 1, 18);
        request.did = Did::from_field(request.did.as_field() + FieldElement::from(1u64));

        let err = empty_prover().prove(&request).unwrap_err();
        assert!(matches!(err, ZkidError::ConsistencyError(_)));
    }

    #[test]
    fn test_commitment_mismatch_aborts() {
        let mut request = ProofRequest::derive(alice(), 1, 1, 18);
        request.commitment = compute_commitment(1, 2, &alice(), &request.did);

        let err = empty_prover().prove(&request).unwrap_err();
        assert!(matches!(err, ZkidError::ConsistencyError(_)));
    }

    #[test]
    fn test_witness_checked_before_keys() {
        // No keys are published, so reaching the key load would be a KeyIoError.
        let request = ProofRequest::derive(alice(), 1, 1, 30);
        let err = empty_prover().prove(&request).unwrap_err();
        assert!(matches!(err, ZkidError::WitnessError(_)));
    }

    #[test]
    fn test_missing_keys() {
        let request = ProofRequest::derive(alice(), 1, 1, 18);
        let err = empty_prover().prove(&request).unwrap_err();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
    }

    #[test]
    fn test_timeout_wrapper_propagates_errors() {
        let request = ProofRequest::derive(alice(), 1, 1, 30);
        let err = empty_prover()
            .prove_with_timeout(request, Duration::from_secs(60))
            .unwrap_err();
        assert!(matches!(err, ZkidError::WitnessError(_)));
    }
}
