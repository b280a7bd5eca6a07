//! 持久化键值存储
//!
//! 缓存与语言偏好都以“一个键对应一个字符串值”的方式落盘。
//! `RedbStore` 写磁盘，`MemoryStore` 只在进程内有效（等价于会话级存储）。

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::translation::error::{TranslationError, TranslationResult};

const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("live_translate_kv");

/// 键值存储接口
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> TranslationResult<Option<String>>;

    fn write(&self, key: &str, value: &str) -> TranslationResult<()>;
}

/// 基于 redb 的磁盘存储
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// 打开（或创建）数据库文件
    pub fn open<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| {
            TranslationError::from(redb::Error::from(e)).with_context(path.display())
        })?;

        tracing::debug!("打开缓存数据库: {}", path.display());
        Ok(Self { db })
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(KV_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn read(&self, key: &str) -> TranslationResult<Option<String>> {
        Ok(self.read_raw(key)?)
    }

    fn write(&self, key: &str, value: &str) -> TranslationResult<()> {
        Ok(self.write_raw(key, value)?)
    }
}

/// 进程内存储
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> TranslationResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| TranslationError::CacheError("内存存储锁已损坏".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> TranslationResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| TranslationError::CacheError("内存存储锁已损坏".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_redb_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            assert_eq!(store.read("lt_lang").unwrap(), None);
            store.write("lt_lang", "fr").unwrap();
            store.write("lt_lang", "de").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.read("lt_lang").unwrap().as_deref(), Some("de"));
    }
}
