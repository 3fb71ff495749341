//! Directory-backed store: one file per key

use super::KeyValueStore;
use crate::utils::safe_filename;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name for `key`, or `None` when the key cannot be stored as a plain file
///
/// Dot-prefixed names are reserved for in-progress writes, and `.tmp`
/// suffixes are refused so no entry can shadow a temporary file.
pub fn entry_name(key: &str) -> Option<String> {
    let name = safe_filename(key.trim());
    if name.is_empty() || name.starts_with('.') || name.ends_with(".tmp") {
        None
    } else {
        Some(name)
    }
}

/// Stores each key as a file inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> crate::Result<PathBuf> {
        entry_name(key)
            .map(|name| self.dir.join(name))
            .ok_or_else(|| crate::Error::Storage(format!("unusable key {:?}", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        match std::fs::read_to_string(self.entry_path(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(crate::Error::Storage(format!("read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        let path = self.entry_path(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| crate::Error::Storage(format!("create {}: {}", self.dir.display(), e)))?;

        // Write-then-rename: readers never see a half-written entry.
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| crate::Error::Storage(format!("write {}: {}", key, e)))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| crate::Error::Storage(format!("write {}: {}", key, e)))?;
        tmp.persist(&path)
            .map_err(|e| crate::Error::Storage(format!("commit {}: {}", key, e.error)))?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        match std::fs::remove_file(self.entry_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::Error::Storage(format!("remove {}: {}", key, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.get("chat_session_id").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_dir_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested/store"));

        store.set("chat_messages", "[]").unwrap();
        store.set("chat_messages", "[1]").unwrap();

        assert_eq!(store.get("chat_messages").unwrap().as_deref(), Some("[1]"));
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("chat_session_id", "session_1_abc").unwrap();
        store.remove("chat_session_id").unwrap();
        store.remove("chat_session_id").unwrap();

        assert!(store.get("chat_session_id").unwrap().is_none());
    }

    #[test]
    fn test_keys_are_sanitized() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("chat/messages", "x").unwrap();
        assert!(temp_dir.path().join("chat_messages").exists());
        assert_eq!(store.get("chat/messages").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_unusable_keys_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        for key in [".", "..", "", ".hidden", "x.tmp"] {
            assert!(entry_name(key).is_none(), "key: {:?}", key);
            let err = store.set(key, "v").unwrap_err();
            assert!(matches!(err, crate::Error::Storage(_)), "key: {:?}", key);
            assert!(matches!(store.get(key), Err(crate::Error::Storage(_))));
        }
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_similar_keys_do_not_clobber() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("x", "session").unwrap();
        store.set("x_tmp", "log").unwrap();
        store.set("x", "session 2").unwrap();

        assert_eq!(store.get("x").unwrap().as_deref(), Some("session 2"));
        assert_eq!(store.get("x_tmp").unwrap().as_deref(), Some("log"));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_unreadable_entry_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        std::fs::create_dir(temp_dir.path().join("chat_messages")).unwrap();

        let err = store.get("chat_messages").unwrap_err();
        assert!(matches!(err, crate::Error::Storage(_)));
    }
}
