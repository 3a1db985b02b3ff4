//! Zero-knowledge attribute threshold circuit
//!
//! A holder proves `threshold <= age` for attributes bound to a public
//! commitment, without revealing the attributes.
//!
//! # Layers
//!
//! ## 1. Parameters and layout
//! - `config` - versioned Poseidon parameters shared by both hash paths
//! - `layout` - public/private signal order and the commitment preimage
//!
//! ## 2. Commitment
//! - `commitment::compute_commitment()` - off-circuit commitment
//!
//! ## 3. Circuit
//! - `model::AttributeCircuit` - R1CS constraints
//! - `witness::Witness` - full assignment with a native pre-check
//!
//! ## 4. Services
//! - `prover::ProverService::prove()` - generate proof and public inputs
//! - `verifier::VerifierService::verify()` - accept or reject

pub mod config;
pub mod layout;
pub mod commitment;
pub mod model;
pub mod witness;
pub mod prover;
pub mod verifier;

pub use commitment::{check_commitment, compute_commitment, Commitment};
pub use config::{poseidon_config, CIRCUIT_ID, HASH_PARAMS_VERSION, PROOF_SCHEME};
pub use layout::{public_input_labels, PrivateSignal, PublicSignal, COMPARED_SIGNAL};
pub use model::{check_constraints, AttributeCircuit};
pub use prover::{ProofOutput, ProofRequest, ProverService};
pub use verifier::VerifierService;
pub use witness::{PublicInputs, Witness};
