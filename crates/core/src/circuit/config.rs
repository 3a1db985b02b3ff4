//! Versioned cryptographic parameters for the attribute threshold circuit
//!
//! This module is the single source of truth for the circuit hash:
//! - Field: BN254 scalar field (`Fr`)
//! - Proving system: Groth16 over BN254
//! - Circuit hash: Poseidon sponge, width 3 (rate 2, capacity 1), alpha 5
//!
//! The off-circuit commitment and the in-circuit gadget both read
//! [`poseidon_config`]. Changing any constant here changes the constraint
//! system fingerprint and invalidates every issued key and proof, so bump
//! [`HASH_PARAMS_VERSION`] and [`CIRCUIT_ID`] together with it.

use std::sync::OnceLock;

use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

use crate::field::FieldElement;

/// Identifier of the circuit version keys and proofs are bound to
pub const CIRCUIT_ID: &str = "zkid-attr-threshold-v1";

/// Name of the proving scheme carried in presentations
pub const PROOF_SCHEME: &str = "groth16-bn254";

/// Name of the Poseidon parameter set below
pub const HASH_PARAMS_VERSION: &str = "zkid-poseidon-bn254-r2c1-v1";

/// Sponge rate (field elements absorbed per permutation)
pub const POSEIDON_RATE: usize = 2;

/// Sponge capacity
pub const POSEIDON_CAPACITY: usize = 1;

/// Full S-box rounds
pub const POSEIDON_FULL_ROUNDS: usize = 8;

/// Partial S-box rounds for width 3 at alpha 5
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
pub const POSEIDON_ALPHA: u64 = 5;

/// Number of leading MDS candidates the Grain LFSR skips
pub const POSEIDON_SKIP_MATRICES: u64 = 0;

static POSEIDON: OnceLock<PoseidonConfig<FieldElement>> = OnceLock::new();

/// Poseidon parameters shared by the native sponge and the constraint gadget.
///
/// Round constants and the MDS matrix are derived deterministically with the
/// Grain LFSR on first use and cached for the life of the process.
pub fn poseidon_config() -> &'static PoseidonConfig<FieldElement> {
    POSEIDON.get_or_init(|| {
        log::debug!(
            "Deriving Poseidon parameters {} (full={}, partial={}, alpha={})",
            HASH_PARAMS_VERSION,
            POSEIDON_FULL_ROUNDS,
            POSEIDON_PARTIAL_ROUNDS,
            POSEIDON_ALPHA
        );

        let (ark, mds) = find_poseidon_ark_and_mds::<FieldElement>(
            FieldElement::MODULUS_BIT_SIZE as u64,
            POSEIDON_RATE,
            POSEIDON_FULL_ROUNDS as u64,
            POSEIDON_PARTIAL_ROUNDS as u64,
            POSEIDON_SKIP_MATRICES,
        );

        PoseidonConfig::new(
            POSEIDON_FULL_ROUNDS,
            POSEIDON_PARTIAL_ROUNDS,
            POSEIDON_ALPHA,
            mds,
            ark,
            POSEIDON_RATE,
            POSEIDON_CAPACITY,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poseidon_config_shape() {
        let config = poseidon_config();
        let width = POSEIDON_RATE + POSEIDON_CAPACITY;

        assert_eq!(config.rate, POSEIDON_RATE);
        assert_eq!(config.capacity, POSEIDON_CAPACITY);
        assert_eq!(config.mds.len(), width);
        assert!(config.mds.iter().all(|row| row.len() == width));
        assert_eq!(config.ark.len(), POSEIDON_FULL_ROUNDS + POSEIDON_PARTIAL_ROUNDS);
    }

    #[test]
    fn test_poseidon_config_is_cached() {
        let a = poseidon_config() as *const _;
        let b = poseidon_config() as *const _;
        assert_eq!(a, b);
    }
}
