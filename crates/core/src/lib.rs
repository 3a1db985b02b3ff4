//! zkid Core Library
//!
//! This library lets a holder prove a threshold predicate over private
//! identity attributes (e.g. age >= 18) without revealing them. Proofs are
//! bound to a policy id, a rule version and a derived identifier (DID)
//! through a Poseidon commitment, and are produced with Groth16 over BN254.

pub mod circuit;
pub mod error;
pub mod field;
pub mod identity;
pub mod keys;
pub mod presentation;

pub use error::{Result, ZkidError};
