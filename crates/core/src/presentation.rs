//! Presentation envelope handed from holder to verifier
//!
//! Carries only public data: the circuit and key it was produced for, the
//! ordered public inputs as decimal strings and the proof itself. Nothing in
//! it can be used to recover the holder's attributes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::circuit::config::{CIRCUIT_ID, PROOF_SCHEME};
use crate::circuit::layout::public_input_labels;
use crate::circuit::prover::ProofOutput;
use crate::circuit::witness::PublicInputs;
use crate::error::{Result, ZkidError};
use crate::keys::ProofBytes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    /// Circuit identifier (e.g., "zkid-attr-threshold-v1")
    pub circuit_id: String,
    /// Proving scheme, always "groth16-bn254"
    pub scheme: String,
    /// Hex-encoded hash of the verifying key the proof targets
    pub vk_hash: String,
    /// Names of the public inputs, in order
    pub public_input_labels: Vec<String>,
    /// Public inputs as canonical decimal strings
    pub public_inputs: Vec<String>,
    /// Base64 URL-safe encoded proof
    pub proof_b64: String,
}

impl Presentation {
    pub fn new(output: &ProofOutput, vk_hash: impl Into<String>) -> Self {
        Self {
            circuit_id: CIRCUIT_ID.to_string(),
            scheme: PROOF_SCHEME.to_string(),
            vk_hash: vk_hash.into(),
            public_input_labels: public_input_labels(),
            public_inputs: output.public_decimal_strings(),
            proof_b64: URL_SAFE_NO_PAD.encode(output.proof.as_bytes()),
        }
    }

    /// Reject envelopes built for another circuit, scheme, key or input layout
    pub fn check_envelope(&self, expected_vk_hash: &str) -> Result<()> {
        if self.circuit_id != CIRCUIT_ID {
            return Err(ZkidError::ConfigurationError(format!(
                "presentation is for circuit '{}', expected '{}'",
                self.circuit_id, CIRCUIT_ID
            )));
        }
        if self.scheme != PROOF_SCHEME {
            return Err(ZkidError::ConfigurationError(format!(
                "unsupported proof scheme '{}'",
                self.scheme
            )));
        }
        if !self.vk_hash.eq_ignore_ascii_case(expected_vk_hash) {
            return Err(ZkidError::ConfigurationError(format!(
                "presentation targets verifying key {}, verifier holds {}",
                self.vk_hash, expected_vk_hash
            )));
        }
        if self.public_input_labels != public_input_labels() {
            return Err(ZkidError::ConfigurationError(format!(
                "public input layout {:?} does not match {:?}",
                self.public_input_labels,
                public_input_labels()
            )));
        }
        Ok(())
    }

    pub fn public_inputs(&self) -> Result<PublicInputs> {
        PublicInputs::from_decimal_strings(&self.public_inputs)
    }

    /// Decode proof bytes from base64
    pub fn decode_proof(&self) -> Result<ProofBytes> {
        URL_SAFE_NO_PAD
            .decode(&self.proof_b64)
            .map(ProofBytes::from_bytes)
            .map_err(|e| ZkidError::InvalidInput(format!("Failed to decode proof: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
