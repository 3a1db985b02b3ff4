//! Key storage shared by the ceremony, prover and verifier
//!
//! Services receive a store explicitly; there is no process-wide key state.
//! A store holds at most one key pair per circuit id, published together.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZkidError};
use crate::keys::ceremony::CircuitFingerprint;
use crate::keys::sealed::{write_atomic, ProvingKeyBytes, VerifyingKeyBytes};

/// Backing storage for ceremony output
pub trait KeyStore: Send + Sync {
    /// True once a complete key pair for `circuit_id` has been published
    fn contains(&self, circuit_id: &str) -> Result<bool>;

    /// Take the exclusive ceremony lock for `circuit_id`
    fn acquire_ceremony(&self, circuit_id: &str) -> Result<()>;

    fn release_ceremony(&self, circuit_id: &str);

    /// Durably store both keys as one unit
    fn publish(&self, circuit_id: &str, pk: &ProvingKeyBytes, vk: &VerifyingKeyBytes) -> Result<()>;

    fn proving_key(&self, circuit_id: &str) -> Result<ProvingKeyBytes>;

    fn verifying_key(&self, circuit_id: &str) -> Result<VerifyingKeyBytes>;
}

fn missing(circuit_id: &str) -> ZkidError {
    ZkidError::KeyIoError(format!(
        "no keys published for {}; run the key ceremony first",
        circuit_id
    ))
}

fn already_running(circuit_id: &str) -> ZkidError {
    ZkidError::KeyIoError(format!("a ceremony for {} is already in progress", circuit_id))
}

fn poisoned() -> ZkidError {
    ZkidError::Other("key store lock poisoned".to_string())
}

/// In-process key store
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, (ProvingKeyBytes, VerifyingKeyBytes)>>,
    ceremonies: Mutex<HashSet<String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn contains(&self, circuit_id: &str) -> Result<bool> {
        Ok(self.keys.read().map_err(|_| poisoned())?.contains_key(circuit_id))
    }

    fn acquire_ceremony(&self, circuit_id: &str) -> Result<()> {
        let mut ceremonies = self.ceremonies.lock().map_err(|_| poisoned())?;
        if !ceremonies.insert(circuit_id.to_string()) {
            return Err(already_running(circuit_id));
        }
        Ok(())
    }

    fn release_ceremony(&self, circuit_id: &str) {
        if let Ok(mut ceremonies) = self.ceremonies.lock() {
            ceremonies.remove(circuit_id);
        }
    }

    fn publish(&self, circuit_id: &str, pk: &ProvingKeyBytes, vk: &VerifyingKeyBytes) -> Result<()> {
        self.keys
            .write()
            .map_err(|_| poisoned())?
            .insert(circuit_id.to_string(), (pk.clone(), vk.clone()));
        Ok(())
    }

    fn proving_key(&self, circuit_id: &str) -> Result<ProvingKeyBytes> {
        self.keys
            .read()
            .map_err(|_| poisoned())?
            .get(circuit_id)
            .map(|(pk, _)| pk.clone())
            .ok_or_else(|| missing(circuit_id))
    }

    fn verifying_key(&self, circuit_id: &str) -> Result<VerifyingKeyBytes> {
        self.keys
            .read()
            .map_err(|_| poisoned())?
            .get(circuit_id)
            .map(|(_, vk)| vk.clone())
            .ok_or_else(|| missing(circuit_id))
    }
}

const PROVING_KEY_FILE: &str = "proving_key.bin";
const VERIFYING_KEY_FILE: &str = "verifying_key.bin";
const MANIFEST_FILE: &str = "manifest.json";
const LOCK_FILE: &str = ".ceremony.lock";

/// Metadata written after both key files; its presence marks a complete pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyManifest {
    pub circuit_id: String,
    pub fingerprint: CircuitFingerprint,
    pub vk_hash: String,
    pub proving_key_hash: String,
    pub proving_key_len: usize,
    pub verifying_key_len: usize,
    pub created_at: DateTime<Utc>,
}

/// Directory-backed key store
///
/// ```text
/// <root>/<circuit_id>/proving_key.bin
/// <root>/<circuit_id>/verifying_key.bin
/// <root>/<circuit_id>/manifest.json
/// <root>/<circuit_id>/.ceremony.lock
/// ```
///
/// The ceremony lock is an exclusive advisory lock on `.ceremony.lock`, held
/// through an open handle. The OS drops it when the process exits, so a
/// crashed ceremony leaves the file behind but not the lock.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
    held: Arc<Mutex<HashMap<String, File>>>,
}

impl FileKeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            held: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn circuit_dir(&self, circuit_id: &str) -> PathBuf {
        self.root.join(circuit_id)
    }

    /// Read the manifest of a published key pair
    pub fn manifest(&self, circuit_id: &str) -> Result<KeyManifest> {
        let path = self.circuit_dir(circuit_id).join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(missing(circuit_id)),
            Err(e) => return Err(ZkidError::KeyIoError(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| ZkidError::KeyIoError(format!("corrupt manifest {}: {}", path.display(), e)))
    }

    fn read_key(&self, circuit_id: &str, file: &str) -> Result<Vec<u8>> {
        let path = self.circuit_dir(circuit_id).join(file);
        fs::read(&path).map_err(|e| ZkidError::KeyIoError(format!("{}: {}", path.display(), e)))
    }
}

impl KeyStore for FileKeyStore {
    fn contains(&self, circuit_id: &str) -> Result<bool> {
        Ok(self.circuit_dir(circuit_id).join(MANIFEST_FILE).is_file())
    }

    fn acquire_ceremony(&self, circuit_id: &str) -> Result<()> {
        let mut held = self.held.lock().map_err(|_| poisoned())?;
        if held.contains_key(circuit_id) {
            return Err(already_running(circuit_id));
        }

        let dir = self.circuit_dir(circuit_id);
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                log::debug!("Acquired ceremony lock in {}", dir.display());
                held.insert(circuit_id.to_string(), file);
                Ok(())
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(already_running(circuit_id)),
            Err(e) => Err(e.into()),
        }
    }

    fn release_ceremony(&self, circuit_id: &str) {
        let Ok(mut held) = self.held.lock() else {
            return;
        };
        // Closing the handle releases the OS lock; the file itself stays.
        if held.remove(circuit_id).is_none() {
            log::warn!("No ceremony lock held for {}", circuit_id);
        }
    }

    fn publish(&self, circuit_id: &str, pk: &ProvingKeyBytes, vk: &VerifyingKeyBytes) -> Result<()> {
        let dir = self.circuit_dir(circuit_id);

        write_atomic(&dir.join(PROVING_KEY_FILE), pk.as_bytes())?;
        write_atomic(&dir.join(VERIFYING_KEY_FILE), vk.as_bytes())?;

        let manifest = KeyManifest {
            circuit_id: circuit_id.to_string(),
            fingerprint: vk.fingerprint()?,
            vk_hash: vk.vk_hash_hex(),
            proving_key_hash: pk.pk_hash_hex(),
            proving_key_len: pk.len(),
            verifying_key_len: vk.len(),
            created_at: Utc::now(),
        };
        write_atomic(&dir.join(MANIFEST_FILE), &serde_json::to_vec_pretty(&manifest)?)?;

        log::info!("✓ Keys for {} written to {}", circuit_id, dir.display());
        Ok(())
    }

    fn proving_key(&self, circuit_id: &str) -> Result<ProvingKeyBytes> {
        let manifest = self.manifest(circuit_id)?;
        let pk = ProvingKeyBytes::from_bytes(self.read_key(circuit_id, PROVING_KEY_FILE)?);
        if pk.len() != manifest.proving_key_len {
            return Err(ZkidError::KeyIoError(format!(
                "proving key for {} is {} bytes, manifest says {}",
                circuit_id,
                pk.len(),
                manifest.proving_key_len
            )));
        }
        if pk.pk_hash_hex() != manifest.proving_key_hash {
            return Err(ZkidError::KeyIoError(format!(
                "proving key for {} does not belong to ceremony {}",
                circuit_id, manifest.vk_hash
            )));
        }
        Ok(pk)
    }

    fn verifying_key(&self, circuit_id: &str) -> Result<VerifyingKeyBytes> {
        let manifest = self.manifest(circuit_id)?;
        let vk = VerifyingKeyBytes::from_bytes(self.read_key(circuit_id, VERIFYING_KEY_FILE)?);
        if vk.vk_hash_hex() != manifest.vk_hash {
            return Err(ZkidError::KeyIoError(format!(
                "verifying key for {} does not match its manifest",
                circuit_id
            )));
        }
        Ok(vk)
    }
}
