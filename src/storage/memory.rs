use std::collections::HashMap;
use std::sync::Mutex;

use super::{validate_key, Storage, StorageError, StorageResult, UpdateFn};

/// 进程内存储
///
/// 整个映射由一把锁保护，`update` 在持锁期间完成读-改-写。
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;
        entries.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;
        let next = f(entries.get(key).cloned())?;
        entries.insert(key.to_string(), next);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Poisoned(key.to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Poisoned("*".to_string()))?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_creates_missing_key() {
        let storage = MemoryStorage::new();

        storage
            .update("list.json", &mut |current| {
                assert!(current.is_none());
                Ok(b"[]".to_vec())
            })
            .unwrap();

        assert_eq!(storage.read("list.json").unwrap(), Some(b"[]".to_vec()));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let storage = MemoryStorage::new();

        let result = storage.update("list.json", &mut |_| {
            Err(StorageError::serialization("list.json", "rejected"))
        });

        assert!(result.is_err());
        assert!(storage.is_empty());
    }
}
