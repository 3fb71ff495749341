//! Durable local key-value storage
//!
//! The conversation keeps two independent entries here: the session
//! identifier and the serialized message log. Values are plain strings; the
//! caller owns the encoding.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Client-side key-value storage that survives restarts
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> crate::Result<()>;
}
