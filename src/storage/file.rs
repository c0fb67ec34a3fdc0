use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tempfile::NamedTempFile;

use super::{validate_key, Storage, StorageError, StorageResult, UpdateFn};

/// 基于目录的存储，每个键对应一个文件
///
/// 写入先落到同目录的临时文件，再通过重命名替换目标文件，
/// 因此并发读者只会看到旧内容或新内容，不会看到写了一半的文件。
pub struct FileStorage {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileStorage {
    /// 打开（必要时创建）存储目录
    pub fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(&root.to_string_lossy(), e))?;

        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().clone()
    }

    fn read_path(key: &str, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn write_path(&self, key: &str, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| StorageError::io(key, e))?;
        tmp.write_all(data).map_err(|e| StorageError::io(key, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(key, e))?;
        tmp.persist(path).map_err(|e| StorageError::io(key, e.error))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        Self::read_path(key, &path)
    }

    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let _guard = lock
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;

        self.write_path(key, &path, data)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let _guard = lock
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;

        let current = Self::read_path(key, &path)?;
        let next = f(current)?;
        self.write_path(key, &path, &next)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock_for(key);
        let guard = lock
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;

        let result = match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        };

        drop(guard);
        drop(lock);
        // 只有映射本身还持有时才删除，等待中的线程仍共用同一把锁
        self.locks.remove_if(key, |_, held| Arc::strong_count(held) == 1);

        result
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let root = self.root.to_string_lossy().to_string();
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.root).map_err(|e| StorageError::io(&root, e))? {
            let entry = entry.map_err(|e| StorageError::io(&root, e))?;
            let is_file = entry
                .file_type()
                .map(|t| t.is_file())
                .map_err(|e| StorageError::io(&root, e))?;
            if !is_file {
                continue;
            }

            // 跳过尚未重命名的临时文件
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(name.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
