use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{Board, ColumnId, Slot};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing key {0:?}")]
    MissingKey(&'static str),
}

/// Synchronous key-value string store that survives restarts.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    /// Write several keys as one unit: either all of them land or none do.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError>;
    /// Remove every key.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

/// Store backed by a JSON object file (`{"key": "value", ...}`).
///
/// The file is read once on open and rewritten in full on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; so is a
    /// file that does not hold a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("ignoring unreadable store {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` to disk, then adopt them. On failure the file and the
    /// in-memory map both keep their previous contents.
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<(), StorageError> {
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        // Write-then-rename so a crash never leaves a truncated store.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.set_many(vec![(key, value)])
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value);
        }
        self.commit(next)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(BTreeMap::new())
    }
}

/// Default store location: `<data_dir>/laneboard/storage.json`.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("laneboard")
        .join("storage.json")
}

/// Load the board from `store`.
///
/// An absent backlog key means the store was never initialized, and every
/// column gets its placeholder item. Anything unparsable also falls back to
/// placeholders.
pub fn load_board(store: &impl KvStore) -> Board {
    if store.get(ColumnId::Backlog.storage_key()).is_none() {
        info!("no saved board, seeding placeholders");
        return Board::with_placeholders();
    }
    match parse_board(store) {
        Ok(board) => {
            debug!("loaded board with {} items", board.total_items());
            board
        }
        Err(e) => {
            warn!("saved board is malformed ({e}), resetting to placeholders");
            Board::with_placeholders()
        }
    }
}

fn parse_board(store: &impl KvStore) -> Result<Board, StorageError> {
    let mut columns: [Vec<Slot>; 4] = Default::default();
    for col in ColumnId::ALL {
        let key = col.storage_key();
        let raw = store.get(key).ok_or(StorageError::MissingKey(key))?;
        columns[col.index()] = serde_json::from_str(&raw)?;
    }
    Ok(Board::from_slots(columns))
}

/// Write every column to `store` as a JSON array, in a single batch.
pub fn save_board(store: &mut impl KvStore, board: &Board) -> Result<(), StorageError> {
    let entries = ColumnId::ALL
        .into_iter()
        .map(|col| -> Result<_, StorageError> {
            Ok((col.storage_key(), serde_json::to_string(board.slots(col))?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    store.set_many(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board() -> Board {
        Board::from_items([
            vec!["write docs".into(), "triage \"bugs\"".into()],
            vec!["ship 0.2".into()],
            vec![],
            vec!["ünïcode ✓".into()],
        ])
    }

    #[test]
    fn empty_store_seeds_placeholders() {
        let store = MemoryStore::new();
        assert_eq!(load_board(&store), Board::with_placeholders());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let mut store = MemoryStore::new();
        let board = sample_board();
        save_board(&mut store, &board).unwrap();
        assert_eq!(load_board(&store), board);
    }

    #[test]
    fn save_writes_json_arrays_per_key() {
        let mut store = MemoryStore::new();
        save_board(&mut store, &sample_board()).unwrap();
        assert_eq!(
            store.get("progressItems").as_deref(),
            Some(r#"["ship 0.2"]"#)
        );
        assert_eq!(store.get("completeItems").as_deref(), Some("[]"));
    }

    #[test]
    fn holes_serialize_as_null() {
        let mut store = MemoryStore::new();
        let mut board = sample_board();
        board.delete(ColumnId::Backlog, 0);
        save_board(&mut store, &board).unwrap();
        assert_eq!(
            store.get("backlogItems").as_deref(),
            Some(r#"[null,"triage \"bugs\""]"#)
        );
    }

    #[test]
    fn malformed_json_falls_back_to_placeholders() {
        let mut store = MemoryStore::new();
        save_board(&mut store, &sample_board()).unwrap();
        store.set("completeItems", "{not json".into()).unwrap();
        assert_eq!(load_board(&store), Board::with_placeholders());
    }

    #[test]
    fn non_array_value_falls_back_to_placeholders() {
        let mut store = MemoryStore::new();
        save_board(&mut store, &sample_board()).unwrap();
        store.set("backlogItems", r#"{"a":1}"#.into()).unwrap();
        assert_eq!(load_board(&store), Board::with_placeholders());
    }

    #[test]
    fn missing_secondary_key_falls_back_to_placeholders() {
        let mut store = MemoryStore::new();
        store.set("backlogItems", r#"["only backlog"]"#.into()).unwrap();
        assert_eq!(load_board(&store), Board::with_placeholders());
    }

    #[test]
    fn memory_store_clear_removes_keys() {
        let mut store = MemoryStore::new();
        store.set("k", "v".into()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        assert_eq!(store.get("backlogItems"), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        save_board(&mut store, &sample_board()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(load_board(&reopened), sample_board());
    }

    #[test]
    fn file_store_garbage_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "definitely not json").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("backlogItems"), None);
        assert_eq!(load_board(&store), Board::with_placeholders());
    }

    #[test]
    fn file_store_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("backlogItems", "[]".into()).unwrap();
        store.clear().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("backlogItems"), None);
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn file_store_failed_batch_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::open(&path).unwrap();
        save_board(&mut store, &sample_board()).unwrap();

        // A non-empty directory at the store path makes the final rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("blocker"), "").unwrap();

        assert!(save_board(&mut store, &Board::with_placeholders()).is_err());
        assert_eq!(load_board(&store), sample_board());
    }

    #[test]
    fn save_is_a_single_batch() {
        #[derive(Default)]
        struct CountingStore {
            inner: MemoryStore,
            batches: usize,
        }

        impl KvStore for CountingStore {
            fn get(&self, key: &str) -> Option<String> {
                self.inner.get(key)
            }
            fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
                self.set_many(vec![(key, value)])
            }
            fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StorageError> {
                self.batches += 1;
                self.inner.set_many(entries)
            }
            fn clear(&mut self) -> Result<(), StorageError> {
                self.inner.clear()
            }
        }

        let mut store = CountingStore::default();
        save_board(&mut store, &sample_board()).unwrap();
        assert_eq!(store.batches, 1);
        assert_eq!(load_board(&store), sample_board());
    }
}
