//! Sealed byte buffers for key material and proofs
//!
//! Keys are stored as envelopes:
//!
//! ```text
//! magic (8) || circuit fingerprint (32) || sha256(payload) (32) || payload
//! ```
//!
//! The payload is the backend's canonical serialization. Proving keys are
//! stored uncompressed and loaded without curve checks; the checksum guards
//! them instead. Verifying keys are compressed and fully validated on load.
//! Proofs are bare compressed Groth16 proofs with no envelope.

use std::fs;
use std::io::Write;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ZkidError};
use crate::keys::ceremony::CircuitFingerprint;

const PROVING_KEY_MAGIC: &[u8; 8] = b"ZKIDPK01";
const VERIFYING_KEY_MAGIC: &[u8; 8] = b"ZKIDVK01";
const HEADER_LEN: usize = 8 + 32 + 32;

/// Size of a compressed BN254 Groth16 proof
pub const PROOF_LEN: usize = 128;

fn seal(magic: &[u8; 8], fingerprint: &CircuitFingerprint, payload: &[u8]) -> Vec<u8> {
    let checksum: [u8; 32] = Sha256::digest(payload).into();
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(magic);
    bytes.extend_from_slice(fingerprint.as_bytes());
    bytes.extend_from_slice(&checksum);
    bytes.extend_from_slice(payload);
    bytes
}

fn header_fingerprint(bytes: &[u8], magic: &[u8; 8], kind: &str) -> Result<CircuitFingerprint> {
    if bytes.len() < HEADER_LEN {
        return Err(ZkidError::KeyIoError(format!(
            "{} is truncated ({} bytes)",
            kind,
            bytes.len()
        )));
    }
    if &bytes[..8] != magic {
        return Err(ZkidError::KeyIoError(format!("{} has an unknown format tag", kind)));
    }
    let mut fingerprint = [0u8; 32];
    fingerprint.copy_from_slice(&bytes[8..40]);
    Ok(CircuitFingerprint::from_bytes(fingerprint))
}

fn open<'a>(
    bytes: &'a [u8],
    magic: &[u8; 8],
    expected: &CircuitFingerprint,
    kind: &str,
) -> Result<&'a [u8]> {
    let fingerprint = header_fingerprint(bytes, magic, kind)?;
    if &fingerprint != expected {
        return Err(ZkidError::KeyIoError(format!(
            "{} belongs to circuit {} (expected {})",
            kind, fingerprint, expected
        )));
    }

    let payload = &bytes[HEADER_LEN..];
    let checksum: [u8; 32] = Sha256::digest(payload).into();
    if checksum[..] != bytes[40..HEADER_LEN] {
        return Err(ZkidError::KeyIoError(format!("{} checksum mismatch", kind)));
    }
    Ok(payload)
}

/// Write `bytes` to a temporary file next to `path`, then rename it into place.
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| ZkidError::IoError(e.error))?;
    Ok(())
}

/// Sealed proving key. Sensitive; stays with the proving operator.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvingKeyBytes(Vec<u8>);

impl ProvingKeyBytes {
    pub fn seal(pk: &ProvingKey<Bn254>, fingerprint: &CircuitFingerprint) -> Result<Self> {
        let mut payload = Vec::with_capacity(pk.uncompressed_size());
        pk.serialize_uncompressed(&mut payload)?;
        Ok(Self(seal(PROVING_KEY_MAGIC, fingerprint, &payload)))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fingerprint(&self) -> Result<CircuitFingerprint> {
        header_fingerprint(&self.0, PROVING_KEY_MAGIC, "proving key")
    }

    /// SHA-256 over the envelope; pairs this key with its ceremony's manifest
    pub fn pk_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(Sha256::digest(&self.0)))
    }

    /// Check the envelope against `expected` and decode the key
    pub fn open(&self, expected: &CircuitFingerprint) -> Result<ProvingKey<Bn254>> {
        let payload = open(&self.0, PROVING_KEY_MAGIC, expected, "proving key")?;
        ProvingKey::<Bn254>::deserialize_uncompressed_unchecked(payload)
            .map_err(|e| ZkidError::KeyIoError(format!("proving key payload: {}", e)))
    }
}

impl std::fmt::Debug for ProvingKeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProvingKeyBytes({} bytes)", self.0.len())
    }
}

/// Sealed verifying key. Public; every verifier needs a copy.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKeyBytes(Vec<u8>);

impl VerifyingKeyBytes {
    pub fn seal(vk: &VerifyingKey<Bn254>, fingerprint: &CircuitFingerprint) -> Result<Self> {
        let mut payload = Vec::with_capacity(vk.compressed_size());
        vk.serialize_compressed(&mut payload)?;
        Ok(Self(seal(VERIFYING_KEY_MAGIC, fingerprint, &payload)))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fingerprint(&self) -> Result<CircuitFingerprint> {
        header_fingerprint(&self.0, VERIFYING_KEY_MAGIC, "verifying key")
    }

    /// SHA-256 over the envelope; identifies one ceremony's verifying key
    pub fn vk_hash(&self) -> [u8; 32] {
        Sha256::digest(&self.0).into()
    }

    pub fn vk_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.vk_hash()))
    }

    pub fn open(&self, expected: &CircuitFingerprint) -> Result<VerifyingKey<Bn254>> {
        let payload = open(&self.0, VERIFYING_KEY_MAGIC, expected, "verifying key")?;
        VerifyingKey::<Bn254>::deserialize_compressed(payload)
            .map_err(|e| ZkidError::KeyIoError(format!("verifying key payload: {}", e)))
    }
}

impl std::fmt::Debug for VerifyingKeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKeyBytes({})", self.vk_hash_hex())
    }
}

/// Opaque serialized Groth16 proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBytes(Vec<u8>);

impl ProofBytes {
    pub fn from_proof(proof: &Proof<Bn254>) -> Result<Self> {
        let mut bytes = Vec::with_capacity(PROOF_LEN);
        proof.serialize_compressed(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode and validate the curve points
    pub fn decode(&self) -> Result<Proof<Bn254>> {
        if self.0.len() != PROOF_LEN {
            return Err(ZkidError::SerializationError(format!(
                "proof must be {} bytes, got {}",
                PROOF_LEN,
                self.0.len()
            )));
        }
        Ok(Proof::<Bn254>::deserialize_compressed(self.0.as_slice())?)
    }

    /// Publish the proof to `path` atomically
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.0)?;
        log::info!("✓ Proof written to {}", path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self(fs::read(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(byte: u8) -> CircuitFingerprint {
        CircuitFingerprint::from_bytes([byte; 32])
    }

    #[test]
    fn test_envelope_roundtrip() {
        let sealed = seal(VERIFYING_KEY_MAGIC, &fingerprint(7), b"payload");
        assert_eq!(sealed.len(), HEADER_LEN + 7);
        let payload = open(&sealed, VERIFYING_KEY_MAGIC, &fingerprint(7), "test").unwrap();
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn test_envelope_rejects_other_circuit() {
        let sealed = seal(VERIFYING_KEY_MAGIC, &fingerprint(7), b"payload");
        let err = open(&sealed, VERIFYING_KEY_MAGIC, &fingerprint(8), "test").unwrap_err();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
    }

    #[test]
    fn test_envelope_rejects_wrong_kind() {
        let sealed = seal(PROVING_KEY_MAGIC, &fingerprint(7), b"payload");
        let err = open(&sealed, VERIFYING_KEY_MAGIC, &fingerprint(7), "test").unwrap_err();
        assert!(err.to_string().contains("format tag"));
    }

    #[test]
    fn test_envelope_detects_corruption() {
        let mut sealed = seal(PROVING_KEY_MAGIC, &fingerprint(7), b"payload");
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let err = open(&sealed, PROVING_KEY_MAGIC, &fingerprint(7), "test").unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_truncated_envelope() {
        let err = open(b"ZKIDPK01", PROVING_KEY_MAGIC, &fingerprint(7), "test").unwrap_err();
        assert!(matches!(err, ZkidError::KeyIoError(_)));
    }

    #[test]
    fn test_proof_length_checked() {
        let err = ProofBytes::from_bytes(vec![0u8; 12]).decode().unwrap_err();
        assert!(matches!(err, ZkidError::SerializationError(_)));
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("proof.bin");

        let proof = ProofBytes::from_bytes(vec![42u8; PROOF_LEN]);
        proof.write_atomic(&path).unwrap();
        assert_eq!(ProofBytes::read(&path).unwrap(), proof);

        // Overwrite leaves exactly one file behind.
        ProofBytes::from_bytes(vec![1u8; PROOF_LEN]).write_atomic(&path).unwrap();
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
