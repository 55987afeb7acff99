//! Storage Module - Durable Key/Value State
//!
//! Every piece of persisted client state is a JSON document stored under a
//! well-known key. Writes are best-effort and non-transactional; callers log
//! failures and keep their in-memory state authoritative.
//!
//! # Backends
//! - `file.rs`: one `<key>.json` file per key under the data directory
//! - `memory.rs`: in-process map (tests, ephemeral sessions)

pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Persisted keys
pub mod keys {
    pub const SIMULATION_DATA: &str = "simulationData";
    pub const INLET_POINT: &str = "inletPoint";
    pub const OUTLET_POINT: &str = "outletPoint";
    pub const SEGMENT_PAIR_CACHE: &str = "segmentPairCache";
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable persistence backend
pub trait StateBackend: Send + Sync {
    /// Raw document for `key`, `None` when never written
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the document for `key`
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load and decode a JSON document
pub fn read_json<T: DeserializeOwned>(
    backend: &dyn StateBackend,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match backend.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and store a JSON document
pub fn write_json<T: Serialize + ?Sized>(
    backend: &dyn StateBackend,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    backend.save(key, &raw)
}

/// Fire-and-forget write: failures are logged, never returned
pub fn persist_best_effort<T: Serialize + ?Sized>(
    backend: &dyn StateBackend,
    key: &str,
    value: &T,
) {
    if let Err(e) = write_json(backend, key, value) {
        log::warn!("Failed to persist '{}': {}", key, e);
    }
}

/// Read that treats unreadable documents as absent
pub fn load_best_effort<T: DeserializeOwned>(backend: &dyn StateBackend, key: &str) -> Option<T> {
    match read_json(backend, key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring unreadable '{}': {}", key, e);
            None
        }
    }
}
