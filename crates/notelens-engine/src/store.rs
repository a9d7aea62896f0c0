//! Metadata and note stores.
//!
//! The metadata store is a JSON-file-backed index of [`NoteRecord`]s; the
//! note store layers file IO and rollback over it so a note file and its
//! record never drift apart permanently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{info, warn};

use notelens_core::sync::IgnoreRwLock;
use notelens_core::{Error, NoteRecord, NoteStatus, Result};

/// Index of note metadata keyed by note path.
///
/// Mutations are individually atomic; callers that need a consistent
/// multi-record view serialize their own access (the batch loop holds the
/// only reference during a run).
pub trait MetadataStore: Send + Sync {
    /// Looks up the record for a path.
    fn get(&self, path: &Path) -> Option<NoteRecord>;

    /// Inserts or replaces a record, keyed by its path.
    fn upsert(&self, record: NoteRecord) -> Result<()>;

    /// Removes the record for a path, returning how many were removed.
    fn remove(&self, path: &Path) -> Result<usize>;

    /// All records, ordered by `order_index` then path.
    fn all(&self) -> Vec<NoteRecord>;

    /// Records matching a predicate, in the same order as [`Self::all`].
    fn search(&self, predicate: &dyn Fn(&NoteRecord) -> bool) -> Vec<NoteRecord>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for std::sync::Arc<T> {
    fn get(&self, path: &Path) -> Option<NoteRecord> {
        (**self).get(path)
    }

    fn upsert(&self, record: NoteRecord) -> Result<()> {
        (**self).upsert(record)
    }

    fn remove(&self, path: &Path) -> Result<usize> {
        (**self).remove(path)
    }

    fn all(&self) -> Vec<NoteRecord> {
        (**self).all()
    }

    fn search(&self, predicate: &dyn Fn(&NoteRecord) -> bool) -> Vec<NoteRecord> {
        (**self).search(predicate)
    }
}

/// [`MetadataStore`] over an in-memory map, optionally persisted to a pretty
/// JSON file after every mutation.
pub struct JsonFileStore {
    records: RwLock<HashMap<PathBuf, NoteRecord>>,
    index_path: Option<PathBuf>,
}

impl JsonFileStore {
    /// Creates a store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            index_path: None,
        }
    }

    /// Opens a store backed by the given index file, loading any existing
    /// records. A missing file starts an empty store.
    pub fn open(index_path: &Path) -> Result<Self> {
        let records = if index_path.exists() {
            let contents = fs::read_to_string(index_path)?;
            let list: Vec<NoteRecord> = serde_json::from_str(&contents)?;
            list.into_iter()
                .map(|record| (record.path.clone(), record))
                .collect()
        } else {
            HashMap::new()
        };

        info!(path = %index_path.display(), "metadata index opened");
        Ok(Self {
            records: RwLock::new(records),
            index_path: Some(index_path.to_path_buf()),
        })
    }

    fn sorted(records: &HashMap<PathBuf, NoteRecord>) -> Vec<NoteRecord> {
        let mut list: Vec<NoteRecord> = records.values().cloned().collect();
        list.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.path.cmp(&b.path))
        });
        list
    }

    fn persist(&self, records: &HashMap<PathBuf, NoteRecord>) -> Result<()> {
        let Some(index_path) = &self.index_path else {
            return Ok(());
        };
        let list = Self::sorted(records);
        let json = serde_json::to_string_pretty(&list)?;
        fs::write(index_path, json)
            .map_err(|err| Error::Store(format!("failed to write metadata index: {err}")))
    }
}

impl MetadataStore for JsonFileStore {
    fn get(&self, path: &Path) -> Option<NoteRecord> {
        self.records.read_ignore_poison().get(path).cloned()
    }

    fn upsert(&self, record: NoteRecord) -> Result<()> {
        let mut records = self.records.write_ignore_poison();
        let previous = records.insert(record.path.clone(), record.clone());

        if let Err(err) = self.persist(&records) {
            // Keep memory and disk consistent by undoing the insert.
            match previous {
                Some(old) => {
                    records.insert(record.path, old);
                }
                None => {
                    records.remove(&record.path);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<usize> {
        let mut records = self.records.write_ignore_poison();
        let Some(removed) = records.remove(path) else {
            return Ok(0);
        };

        if let Err(err) = self.persist(&records) {
            records.insert(removed.path.clone(), removed);
            return Err(err);
        }
        Ok(1)
    }

    fn all(&self) -> Vec<NoteRecord> {
        Self::sorted(&self.records.read_ignore_poison())
    }

    fn search(&self, predicate: &dyn Fn(&NoteRecord) -> bool) -> Vec<NoteRecord> {
        Self::sorted(&self.records.read_ignore_poison())
            .into_iter()
            .filter(|record| predicate(record))
            .collect()
    }
}

/// Note file storage with transactional metadata updates.
pub trait NoteStore: Send + Sync {
    /// Reads the content of a note file.
    fn read(&self, path: &Path) -> Result<String>;

    /// Writes a note file and upserts its metadata record, returning the
    /// note title. Neither side is left half-applied on failure.
    fn save(&self, path: &Path, content: &str) -> Result<String>;

    /// Removes a note and its metadata record, returning a status message.
    fn remove(&self, path: &Path) -> Result<String>;
}

/// [`NoteStore`] over the local filesystem and a [`MetadataStore`].
pub struct FileNoteStore<S: MetadataStore> {
    metadata: S,
}

impl<S: MetadataStore> FileNoteStore<S> {
    /// Creates the store over a metadata index.
    pub fn new(metadata: S) -> Self {
        Self { metadata }
    }

    /// The underlying metadata store.
    pub fn metadata(&self) -> &S {
        &self.metadata
    }

    /// Reconciles the metadata index with the note directories.
    ///
    /// Unknown `.md` files gain a record with the status implied by their
    /// directory; records whose file no longer exists are dropped.
    pub fn sync_directories(&self, notes_dir: &Path, archive_dir: &Path) -> Result<()> {
        for (dir, status) in [(notes_dir, NoteStatus::Active), (archive_dir, NoteStatus::Archived)]
        {
            if !dir.exists() {
                continue;
            }
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().is_none_or(|ext| ext != "md") {
                    continue;
                }
                if self.metadata.get(&path).is_none() {
                    info!(path = %path.display(), "adding untracked note to index");
                    let mut record = NoteRecord::new(&path, status);
                    record.order_index = self.next_order_index();
                    self.metadata.upsert(record)?;
                }
            }
        }

        for record in self.metadata.all() {
            if !record.path.exists() {
                warn!(path = %record.path.display(), "dropping orphaned note record");
                self.metadata.remove(&record.path)?;
            }
        }
        Ok(())
    }

    fn next_order_index(&self) -> i64 {
        self.metadata
            .all()
            .iter()
            .map(|record| record.order_index)
            .max()
            .map_or(0, |max| max + 1)
    }
}

impl<S: MetadataStore> NoteStore for FileNoteStore<S> {
    fn read(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn save(&self, path: &Path, content: &str) -> Result<String> {
        // Snapshot the current file so a failed metadata update can be
        // rolled back without losing the previous content.
        let backup = if path.exists() {
            Some(fs::read(path)?)
        } else {
            None
        };

        fs::write(path, content)?;

        let record = match self.metadata.get(path) {
            Some(existing) => existing,
            None => {
                let mut fresh = NoteRecord::new(path, NoteStatus::Active);
                fresh.order_index = self.next_order_index();
                fresh
            }
        };
        let title = record.title.clone();

        if let Err(err) = self.metadata.upsert(record) {
            warn!(path = %path.display(), error = %err, "metadata update failed, rolling back file");
            let rollback = match backup {
                Some(bytes) => fs::write(path, bytes),
                None => fs::remove_file(path),
            };
            if let Err(rollback_err) = rollback {
                warn!(path = %path.display(), error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }

        Ok(title)
    }

    fn remove(&self, path: &Path) -> Result<String> {
        let record = self.metadata.get(path);
        let removed = self.metadata.remove(path)?;

        if let Err(err) = fs::remove_file(path) {
            // The record is already gone; put it back so the index still
            // knows about the file we could not delete.
            if let Some(record) = record {
                if let Err(restore_err) = self.metadata.upsert(record) {
                    warn!(path = %path.display(), error = %restore_err, "failed to restore record");
                }
            }
            return Err(Error::Store(format!(
                "failed to delete note file: {err}"
            )));
        }

        if removed == 0 {
            Ok("note file deleted (no metadata record existed)".to_owned())
        } else {
            Ok("note and metadata removed".to_owned())
        }
    }
}
