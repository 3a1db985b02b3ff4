//! Circuit compilation and the one-time Groth16 key ceremony
//!
//! A ceremony compiles the blank circuit, runs circuit-specific setup and
//! publishes both keys to a [`KeyStore`] in a single step while holding the
//! store's exclusive ceremony lock. The keys are bound to the compiled
//! circuit through its [`CircuitFingerprint`].
//!
//! Running setup twice on the same circuit yields two incompatible key
//! pairs, so a store that already holds keys is never overwritten.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ark_bn254::Bn254;
use ark_groth16::Groth16;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, SynthesisMode};
use ark_snark::SNARK;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::circuit::config::{CIRCUIT_ID, HASH_PARAMS_VERSION};
use crate::circuit::layout::{PRIVATE_SIGNALS, PUBLIC_SIGNALS};
use crate::circuit::model::AttributeCircuit;
use crate::error::{Result, ZkidError};
use crate::field::FieldElement;
use crate::keys::sealed::{ProvingKeyBytes, VerifyingKeyBytes};
use crate::keys::store::KeyStore;

/// SHA-256 identity of a compiled constraint system
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CircuitFingerprint([u8; 32]);

impl CircuitFingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CircuitFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CircuitFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CircuitFingerprint({})", self)
    }
}

impl FromStr for CircuitFingerprint {
    type Err = ZkidError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| ZkidError::InvalidInput(format!("Invalid fingerprint hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ZkidError::InvalidInput(format!("Fingerprint must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for CircuitFingerprint {
    type Error = ZkidError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CircuitFingerprint> for String {
    fn from(fingerprint: CircuitFingerprint) -> Self {
        fingerprint.to_string()
    }
}

/// Shape of the compiled constraint system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit {
    pub circuit_id: &'static str,
    pub num_constraints: usize,
    pub num_public_inputs: usize,
    pub num_witness_variables: usize,
    pub fingerprint: CircuitFingerprint,
}

fn update_labelled(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Synthesise the blank circuit in setup mode and fingerprint the result
pub fn compile_circuit() -> Result<CompiledCircuit> {
    log::info!("Compiling circuit {}", CIRCUIT_ID);

    let cs = ConstraintSystem::<FieldElement>::new_ref();
    cs.set_mode(SynthesisMode::Setup);
    AttributeCircuit::blank()
        .generate_constraints(cs.clone())
        .map_err(|e| ZkidError::CompilationError(e.to_string()))?;
    cs.finalize();

    // The constant one is an instance variable too.
    let num_public_inputs = cs.num_instance_variables().saturating_sub(1);
    if num_public_inputs != PUBLIC_SIGNALS.len() {
        return Err(ZkidError::CompilationError(format!(
            "circuit declares {} public inputs, layout has {}",
            num_public_inputs,
            PUBLIC_SIGNALS.len()
        )));
    }

    let num_constraints = cs.num_constraints();
    let num_witness_variables = cs.num_witness_variables();

    let mut hasher = Sha256::new();
    update_labelled(&mut hasher, CIRCUIT_ID.as_bytes());
    update_labelled(&mut hasher, HASH_PARAMS_VERSION.as_bytes());
    for signal in PUBLIC_SIGNALS {
        update_labelled(&mut hasher, signal.label().as_bytes());
    }
    for signal in PRIVATE_SIGNALS {
        update_labelled(&mut hasher, signal.label().as_bytes());
    }
    hasher.update((num_constraints as u64).to_le_bytes());
    hasher.update((num_public_inputs as u64).to_le_bytes());
    hasher.update((num_witness_variables as u64).to_le_bytes());
    let fingerprint = CircuitFingerprint(hasher.finalize().into());

    log::info!(
        "✓ Compiled {} constraints, {} public inputs, {} witness variables",
        num_constraints,
        num_public_inputs,
        num_witness_variables
    );
    log::debug!("Circuit fingerprint: {}", fingerprint);

    Ok(CompiledCircuit {
        circuit_id: CIRCUIT_ID,
        num_constraints,
        num_public_inputs,
        num_witness_variables,
        fingerprint,
    })
}

static COMPILED: OnceLock<CompiledCircuit> = OnceLock::new();

/// Fingerprint of the circuit built into this binary, compiled once per process
pub fn current_fingerprint() -> Result<CircuitFingerprint> {
    if let Some(compiled) = COMPILED.get() {
        return Ok(compiled.fingerprint);
    }
    let compiled = compile_circuit()?;
    Ok(COMPILED.get_or_init(|| compiled).fingerprint)
}

/// Summary of a completed ceremony
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyReport {
    pub circuit_id: String,
    pub fingerprint: CircuitFingerprint,
    pub vk_hash: String,
    pub num_constraints: usize,
    pub proving_key_len: usize,
    pub verifying_key_len: usize,
    pub created_at: DateTime<Utc>,
}

/// Holds a store's ceremony lock for the lifetime of the value
struct CeremonyGuard<'a> {
    store: &'a dyn KeyStore,
    circuit_id: &'a str,
}

impl<'a> CeremonyGuard<'a> {
    fn acquire(store: &'a dyn KeyStore, circuit_id: &'a str) -> Result<Self> {
        store.acquire_ceremony(circuit_id)?;
        Ok(Self { store, circuit_id })
    }
}

impl Drop for CeremonyGuard<'_> {
    fn drop(&mut self) {
        self.store.release_ceremony(self.circuit_id);
    }
}

/// One-time trusted setup for the current circuit version
pub struct KeyCeremony;

impl KeyCeremony {
    /// Run setup with operating-system randomness
    pub fn run(store: &dyn KeyStore) -> Result<CeremonyReport> {
        Self::run_with_rng(store, &mut OsRng)
    }

    pub fn run_with_rng<R: RngCore + CryptoRng>(store: &dyn KeyStore, rng: &mut R) -> Result<CeremonyReport> {
        log::info!("Starting key ceremony for {}", CIRCUIT_ID);
        let _guard = CeremonyGuard::acquire(store, CIRCUIT_ID)?;

        if store.contains(CIRCUIT_ID)? {
            log::warn!("Keys for {} already exist; refusing to overwrite", CIRCUIT_ID);
            return Err(ZkidError::KeyIoError(format!(
                "keys for {} already exist; a new ceremony would invalidate them",
                CIRCUIT_ID
            )));
        }

        let compiled = compile_circuit()?;

        log::info!("Running Groth16 setup (this may take a few seconds)...");
        let start = std::time::Instant::now();
        let (pk, vk) = <Groth16<Bn254> as SNARK<FieldElement>>::circuit_specific_setup(AttributeCircuit::blank(), rng)
            .map_err(|e| ZkidError::CompilationError(format!("setup failed: {}", e)))?;
        log::info!("✓ Setup completed in {:.2?}", start.elapsed());

        let inputs = vk.gamma_abc_g1.len().saturating_sub(1);
        if inputs != PUBLIC_SIGNALS.len() {
            return Err(ZkidError::CompilationError(format!(
                "verifying key expects {} public inputs, layout has {}",
                inputs,
                PUBLIC_SIGNALS.len()
            )));
        }

        let proving_key = ProvingKeyBytes::seal(&pk, &compiled.fingerprint)?;
        let verifying_key = VerifyingKeyBytes::seal(&vk, &compiled.fingerprint)?;

        store.publish(CIRCUIT_ID, &proving_key, &verifying_key)?;

        let report = CeremonyReport {
            circuit_id: CIRCUIT_ID.to_string(),
            fingerprint: compiled.fingerprint,
            vk_hash: verifying_key.vk_hash_hex(),
            num_constraints: compiled.num_constraints,
            proving_key_len: proving_key.len(),
            verifying_key_len: verifying_key.len(),
            created_at: Utc::now(),
        };

        log::info!(
            "✓ Published keys for {} (pk {} bytes, vk {})",
            CIRCUIT_ID,
            report.proving_key_len,
            report.vk_hash
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::store::MemoryKeyStore;

    #[test]
    fn test_compile_is_stable() {
        let a = compile_circuit().unwrap();
        let b = compile_circuit().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.num_public_inputs, 4);
        assert_eq!(current_fingerprint().unwrap(), a.fingerprint);
    }

    #[test]
    fn test_fingerprint_text() {
        let fingerprint = compile_circuit().unwrap().fingerprint;
        let text = fingerprint.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.parse::<CircuitFingerprint>().unwrap(), fingerprint);
        assert!("0x1234".parse::<CircuitFingerprint>().is_err());
    }

    #[test]
    fn test_ceremony_publishes_and_refuses_rerun() {
        let store = MemoryKeyStore::new();
        let report = KeyCeremony::run(&store).unwrap();

        assert_eq!(report.circuit_id, CIRCUIT_ID);
        assert!(store.contains(CIRCUIT_ID).unwrap());
        let vk = store.verifying_key(CIRCUIT_ID).unwrap();
        assert_eq!(vk.vk_hash_hex(), report.vk_hash);
        assert_eq!(vk.fingerprint().unwrap(), report.fingerprint);

        let err = KeyCeremony::run(&store).unwrap_err();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
        // The lock is released on the error path too.
        assert!(store.acquire_ceremony(CIRCUIT_ID).is_ok());
        store.release_ceremony(CIRCUIT_ID);
    }

    #[test]
    fn test_ceremonies_are_not_interchangeable() {
        let first = MemoryKeyStore::new();
        let second = MemoryKeyStore::new();
        let a = KeyCeremony::run(&first).unwrap();
        let b = KeyCeremony::run(&second).unwrap();

        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.vk_hash, b.vk_hash);
    }

    #[test]
    fn test_ceremony_blocked_while_locked() {
        let store = MemoryKeyStore::new();
        store.acquire_ceremony(CIRCUIT_ID).unwrap();

        let err = KeyCeremony::run(&store).unwrap_err();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
        assert!(!store.contains(CIRCUIT_ID).unwrap());
    }
}
