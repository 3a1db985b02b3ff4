//! Key material: sealed buffers, storage, the setup ceremony and export

pub mod ceremony;
pub mod export;
pub mod sealed;
pub mod store;

pub use ceremony::{compile_circuit, current_fingerprint, CeremonyReport, CircuitFingerprint, CompiledCircuit, KeyCeremony};
pub use export::{export_verifier_constants, ProofCalldata, VerifierConstants};
pub use sealed::{ProofBytes, ProvingKeyBytes, VerifyingKeyBytes, PROOF_LEN};
pub use store::{FileKeyStore, KeyManifest, KeyStore, MemoryKeyStore};
