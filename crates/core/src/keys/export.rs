//! One-way export of verifying keys and proofs as decimal curve coordinates
//!
//! The output feeds external verifier generators such as an EVM pairing
//! precompile contract. G2 coordinates follow EIP-197 ordering: each `Fq2`
//! element is written imaginary part first, `[c1, c0]`.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keys::ceremony::current_fingerprint;
use crate::keys::sealed::{ProofBytes, VerifyingKeyBytes};

pub type G1Coordinates = [String; 2];
pub type G2Coordinates = [[String; 2]; 2];

/// Verifying key constants for an external verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConstants {
    pub alpha: G1Coordinates,
    pub beta: G2Coordinates,
    pub gamma: G2Coordinates,
    pub delta: G2Coordinates,
    /// One point for the constant term, then one per public input
    pub ic: Vec<G1Coordinates>,
}

/// Proof points for an external verifier call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofCalldata {
    pub a: G1Coordinates,
    pub b: G2Coordinates,
    pub c: G1Coordinates,
}

fn fq_decimal(value: &Fq) -> String {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le()).to_string()
}

fn fq2_decimal(value: &Fq2) -> [String; 2] {
    [fq_decimal(&value.c1), fq_decimal(&value.c0)]
}

fn g1(point: &G1Affine) -> G1Coordinates {
    [fq_decimal(&point.x), fq_decimal(&point.y)]
}

fn g2(point: &G2Affine) -> G2Coordinates {
    [fq2_decimal(&point.x), fq2_decimal(&point.y)]
}

/// Export the curve points of a verifying key built for the current circuit
pub fn export_verifier_constants(vk: &VerifyingKeyBytes) -> Result<VerifierConstants> {
    let vk = vk.open(&current_fingerprint()?)?;
    Ok(VerifierConstants {
        alpha: g1(&vk.alpha_g1),
        beta: g2(&vk.beta_g2),
        gamma: g2(&vk.gamma_g2),
        delta: g2(&vk.delta_g2),
        ic: vk.gamma_abc_g1.iter().map(g1).collect(),
    })
}

impl ProofBytes {
    /// Decode the proof and export its points
    pub fn to_calldata(&self) -> Result<ProofCalldata> {
        let proof = self.decode()?;
        Ok(ProofCalldata {
            a: g1(&proof.a),
            b: g2(&proof.b),
            c: g1(&proof.c),
        })
    }
}
