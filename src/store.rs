// ---------------- 本地键值存储 ----------------
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write local store {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize local store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 设备本地的键值存储，每个 key 对应一个 JSON 值。
pub trait KvStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// 整个文件是一个 JSON 对象；每次 set 都整体回写。
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl FileStore {
    /// 文件不存在或内容损坏都按空存储处理，不阻塞启动
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|err| {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "local store is corrupt, starting empty"
                );
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "local store unreadable, starting empty"
                );
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let s = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, s).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }
}

/// 内存实现；clone 出来的句柄共享同一份数据，便于测试观察写入。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, Value>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: Value) -> Self {
        let store = Self::new();
        store
            .inner
            .borrow_mut()
            .entries
            .insert(key.to_string(), value);
        store
    }

    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.entries.insert(key.to_string(), value);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = FileStore::open(&path);
        assert_eq!(store.get("k"), None);
        store.set("k", json!({"1": {"done": true}})).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("k"), Some(json!({"1": {"done": true}})));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::open(&path);
        assert_eq!(store.get("prepmaster_tags"), None);
    }

    #[test]
    fn memory_store_handles_share_data() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        handle.set("k", json!(1)).unwrap();
        assert_eq!(store.get("k"), Some(json!(1)));
        assert_eq!(store.writes(), 1);
    }
}
