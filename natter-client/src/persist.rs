use std::{
    cell::RefCell,
    collections::HashSet,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    api::{Comment, CommentId, Error},
    SortMode,
};

/// Name of the durable slot, used as file stem or LocalStorage key
pub const DEFAULT_KEY: &str = "natter-comments";

/// The durable part of the comment store
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Written as a sorted list, read back into a set
    #[serde(default)]
    pub upvoted_ids: Vec<CommentId>,

    #[serde(default)]
    pub sort_mode: SortMode,
}

impl Snapshot {
    /// Provisional comments are left out, they would never be confirmed after a reload
    pub fn capture(comments: &[Comment], upvoted: &HashSet<CommentId>, sort_mode: SortMode) -> Snapshot {
        let mut upvoted_ids = upvoted.iter().cloned().collect::<Vec<_>>();
        upvoted_ids.sort();
        Snapshot {
            comments: comments
                .iter()
                .filter(|c| !c.is_provisional())
                .cloned()
                .collect(),
            upvoted_ids,
            sort_mode,
        }
    }

    pub fn upvoted_set(&self) -> HashSet<CommentId> {
        self.upvoted_ids.iter().cloned().collect()
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Snapshot, Error> {
        Ok(serde_json::from_str(s)?)
    }
}

/// One durable key-value slot holding a `Snapshot`
pub trait SnapshotSlot {
    /// Ok(None) when nothing was ever saved
    fn read(&self) -> Result<Option<Snapshot>, Error>;
    fn write(&self, snapshot: &Snapshot) -> Result<(), Error>;
}

impl<T: SnapshotSlot + ?Sized> SnapshotSlot for Rc<T> {
    fn read(&self) -> Result<Option<Snapshot>, Error> {
        (**self).read()
    }

    fn write(&self, snapshot: &Snapshot) -> Result<(), Error> {
        (**self).write(snapshot)
    }
}

/// Snapshot stored as a JSON file
#[derive(Clone, Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> FileSlot {
        FileSlot { path: path.into() }
    }

    /// `<dir>/<key>.json`
    pub fn in_dir(dir: &Path, key: &str) -> FileSlot {
        FileSlot::new(dir.join(format!("{key}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSlot for FileSlot {
    fn read(&self) -> Result<Option<Snapshot>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Snapshot::from_json(&s).map(Some),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("reading {:?}: {e}", self.path))),
        }
    }

    fn write(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let json = snapshot.to_json()?;
        // Write then rename, so that a crash never leaves a truncated snapshot behind
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| Error::Storage(format!("writing {tmp:?}: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("renaming {tmp:?} to {:?}: {e}", self.path)))?;
        tracing::trace!(path = ?self.path, "snapshot saved");
        Ok(())
    }
}

/// In-memory slot, holding the serialized form so that it goes through the same
/// encoding as the durable slots
#[derive(Debug, Default)]
pub struct MemorySlot(RefCell<Option<String>>);

impl MemorySlot {
    pub fn new() -> MemorySlot {
        MemorySlot::default()
    }

    pub fn with_raw(json: &str) -> MemorySlot {
        MemorySlot(RefCell::new(Some(json.to_string())))
    }

    pub fn raw(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

impl SnapshotSlot for MemorySlot {
    fn read(&self) -> Result<Option<Snapshot>, Error> {
        self.0.borrow().as_deref().map(Snapshot::from_json).transpose()
    }

    fn write(&self, snapshot: &Snapshot) -> Result<(), Error> {
        *self.0.borrow_mut() = Some(snapshot.to_json()?);
        Ok(())
    }
}

/// Browser LocalStorage slot
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct LocalStorageSlot {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageSlot {
    pub fn new(key: &str) -> LocalStorageSlot {
        LocalStorageSlot {
            key: key.to_string(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl SnapshotSlot for LocalStorageSlot {
    fn read(&self) -> Result<Option<Snapshot>, Error> {
        use gloo_storage::{errors::StorageError, LocalStorage, Storage};
        match LocalStorage::get::<Snapshot>(&self.key) {
            Ok(s) => Ok(Some(s)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    fn write(&self, snapshot: &Snapshot) -> Result<(), Error> {
        use gloo_storage::{LocalStorage, Storage};
        LocalStorage::set(&self.key, snapshot).map_err(|e| Error::Storage(e.to_string()))
    }
}
