//! Cursor store — persists the delta feed's resumption token between runs.
//!
//! The token lives in one blob of an opaque [`BlobStore`] as a JSON document:
//!
//! ```json
//! { "cursor": "<opaque token>", "saved_at": "2026-10-17T00:10:00Z" }
//! ```
//!
//! Blobs written by older deployments hold only the raw token text; those are
//! still accepted on load. A missing blob means "full sync", not an error.
//!
//! [`FileBlobStore`] writes use the `.tmp` + rename pattern so a crash never
//! leaves a half-written cursor behind.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use provision_core::Cursor;

use crate::error::{io_err, StoreError};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Minimal key/value text store holding the cursor blob.
#[cfg_attr(test, mockall::automock)]
pub trait BlobStore {
    /// Create the container if it does not exist yet.
    fn ensure_container(&self) -> Result<(), StoreError>;
    fn exists(&self, key: &str) -> Result<bool, StoreError>;
    fn read_text(&self, key: &str) -> Result<String, StoreError>;
    fn write_text(&self, key: &str, text: &str) -> Result<(), StoreError>;
    /// Returns `false` when there was nothing to delete.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn ensure_container(&self) -> Result<(), StoreError> {
        (**self).ensure_container()
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists(key)
    }

    fn read_text(&self, key: &str) -> Result<String, StoreError> {
        (**self).read_text(key)
    }

    fn write_text(&self, key: &str, text: &str) -> Result<(), StoreError> {
        (**self).write_text(key, text)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key)
    }
}

/// Load / save / clear of the single live cursor.
#[cfg_attr(test, mockall::automock)]
pub trait CursorStore {
    /// `Ok(None)` when no cursor was ever saved (or it was cleared).
    fn load(&self) -> Result<Option<Cursor>, StoreError>;
    /// Overwrite the live cursor unconditionally.
    fn save(&self, cursor: &Cursor) -> Result<(), StoreError>;
    /// Forget the live cursor so the next run performs a full sync.
    fn clear(&self) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Cursor document
// ---------------------------------------------------------------------------

/// On-blob cursor payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CursorDocument {
    pub cursor: Cursor,
    /// `None` for legacy raw-token blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CursorDocument {
    /// Parse blob text. Empty text yields `None`.
    pub fn parse(text: &str) -> Result<Option<Self>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if text.starts_with('{') {
            let doc: CursorDocument = serde_json::from_str(text)?;
            if doc.cursor.as_str().is_empty() {
                return Ok(None);
            }
            return Ok(Some(doc));
        }
        Ok(Some(CursorDocument {
            cursor: Cursor::new(text),
            saved_at: None,
        }))
    }
}

/// Short, stable fingerprint of a cursor for log lines and reports.
pub fn fingerprint(cursor: &Cursor) -> String {
    let mut h = Sha256::new();
    h.update(cursor.as_str().as_bytes());
    let digest = hex::encode(h.finalize());
    digest[..12].to_string()
}

// ---------------------------------------------------------------------------
// BlobCursorStore
// ---------------------------------------------------------------------------

/// [`CursorStore`] backed by one key of a [`BlobStore`].
pub struct BlobCursorStore<B> {
    blob: B,
    key: String,
}

impl<B: BlobStore> BlobCursorStore<B> {
    pub fn new(blob: B, key: impl Into<String>) -> Self {
        Self {
            blob,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the full stored document, including when it was saved.
    pub fn inspect(&self) -> Result<Option<CursorDocument>, StoreError> {
        if !self.blob.exists(&self.key)? {
            return Ok(None);
        }
        let text = match self.blob.read_text(&self.key) {
            Ok(text) => text,
            // Deleted between the existence check and the read.
            Err(StoreError::Remote(crate::RemoteError::NotFound { .. })) => return Ok(None),
            Err(err) => return Err(err),
        };
        CursorDocument::parse(&text)
    }
}

impl<B: BlobStore> CursorStore for BlobCursorStore<B> {
    fn load(&self) -> Result<Option<Cursor>, StoreError> {
        Ok(self.inspect()?.map(|doc| doc.cursor))
    }

    fn save(&self, cursor: &Cursor) -> Result<(), StoreError> {
        let doc = CursorDocument {
            cursor: cursor.clone(),
            saved_at: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        self.blob.ensure_container()?;
        self.blob.write_text(&self.key, &json)
    }

    fn clear(&self) -> Result<bool, StoreError> {
        self.blob.delete(&self.key)
    }
}

// ---------------------------------------------------------------------------
// FileBlobStore
// ---------------------------------------------------------------------------

/// [`BlobStore`] rooted at `<root>/<container>/` on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    container_dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: &Path, container: &str) -> Self {
        Self {
            container_dir: root.join(container),
        }
    }

    pub fn container_dir(&self) -> &Path {
        &self.container_dir
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(io_err(
                &self.container_dir,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid blob key '{key}'"),
                ),
            ));
        }
        Ok(self.container_dir.join(key))
    }
}

impl BlobStore for FileBlobStore {
    fn ensure_container(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.container_dir).map_err(|e| io_err(&self.container_dir, e))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.blob_path(key)?.is_file())
    }

    fn read_text(&self, key: &str) -> Result<String, StoreError> {
        let path = self.blob_path(key)?;
        std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))
    }

    /// Writes to `<key>.tmp` then renames to `<key>`.
    fn write_text(&self, key: &str, text: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        let tmp = self.container_dir.join(format!("{key}.tmp"));
        std::fs::write(&tmp, text).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.blob_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn file_store(tmp: &TempDir) -> BlobCursorStore<FileBlobStore> {
        BlobCursorStore::new(FileBlobStore::new(tmp.path(), "state"), "deltalink.json")
    }

    #[test]
    fn absent_when_blob_missing() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(&tmp);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(&tmp);
        store.save(&Cursor::new("T2")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Cursor::new("T2")));

        let doc = store.inspect().unwrap().expect("document");
        assert!(doc.saved_at.is_some());
    }

    #[test]
    fn save_overwrites_previous_value() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(&tmp);
        store.save(&Cursor::new("T1")).unwrap();
        store.save(&Cursor::new("T2")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Cursor::new("T2")));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(&tmp);
        store.save(&Cursor::new("T0")).unwrap();
        let tmp_path = tmp.path().join("state").join("deltalink.json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn legacy_raw_token_blob_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("state");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("deltalink.json"),
            "https://graph.microsoft.com/v1.0/users/delta?$deltatoken=abc\n",
        )
        .unwrap();

        let store = file_store(&tmp);
        let doc = store.inspect().unwrap().expect("document");
        assert_eq!(
            doc.cursor.as_str(),
            "https://graph.microsoft.com/v1.0/users/delta?$deltatoken=abc"
        );
        assert!(doc.saved_at.is_none());
    }

    #[test]
    fn empty_blob_loads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("state");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("deltalink.json"), "  \n").unwrap();
        assert_eq!(file_store(&tmp).load().unwrap(), None);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("state");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("deltalink.json"), "{ not json").unwrap();
        assert!(matches!(file_store(&tmp).load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn clear_forces_full_sync() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(&tmp);
        store.save(&Cursor::new("T1")).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap(), "second clear has nothing to delete");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let blob = FileBlobStore::new(tmp.path(), "state");
        assert!(blob.write_text("../escape", "x").is_err());
        assert!(blob.exists("a/b").is_err());
    }

    #[test]
    fn save_ensures_container_before_writing() {
        let mut blob = MockBlobStore::new();
        let mut seq = mockall::Sequence::new();
        blob.expect_ensure_container()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        blob.expect_write_text()
            .with(eq("cursor.json"), mockall::predicate::always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let store = BlobCursorStore::new(blob, "cursor.json");
        store.save(&Cursor::new("T9")).unwrap();
    }

    #[test]
    fn missing_blob_skips_read() {
        let mut blob = MockBlobStore::new();
        blob.expect_exists().returning(|_| Ok(false));
        blob.expect_read_text().never();

        let store = BlobCursorStore::new(blob, "cursor.json");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = fingerprint(&Cursor::new("T2"));
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint(&Cursor::new("T2")));
        assert_ne!(a, fingerprint(&Cursor::new("T3")));
    }
}
