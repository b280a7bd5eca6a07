//! 翻译缓存模块
//!
//! (目标语言, 原文) → 译文 的记忆表。键是语言代码与原文的精确拼接，不做任何
//! 空白或大小写归一化。条目在会话内只增不删；整张表序列化为一个 JSON 对象，
//! 存放在持久化存储的单个键下。

use std::collections::HashMap;
use std::sync::Arc;

use crate::translation::error::TranslationError;
use crate::translation::storage::kv::{KeyValueStore, MemoryStore};

/// 语言代码与原文之间的分隔符
const KEY_SEPARATOR: &str = "::";

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub flushes: u64,
    pub failed_flushes: u64,
}

/// 翻译缓存
pub struct CacheStore {
    entries: HashMap<String, String>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    dirty: bool,
    stats: CacheStats,
}

impl CacheStore {
    /// 从持久化存储加载缓存
    ///
    /// 读取失败或内容损坏都退化为空缓存，只记录日志。
    pub fn load(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();

        let entries = match store.read(&storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    TranslationError::from(e)
                        .with_context(&storage_key)
                        .log("缓存内容损坏，使用空缓存");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                e.log("读取缓存失败，使用空缓存");
                HashMap::new()
            }
        };

        tracing::debug!("加载缓存 {}: {} 条", storage_key, entries.len());

        let stats = CacheStats {
            total_entries: entries.len(),
            ..CacheStats::default()
        };

        Self {
            entries,
            store,
            storage_key,
            dirty: false,
            stats,
        }
    }

    /// 仅存在于内存中的缓存
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::new()), "lt_cache")
    }

    /// 生成缓存键
    pub fn cache_key(lang: &str, text: &str) -> String {
        let mut key = String::with_capacity(lang.len() + KEY_SEPARATOR.len() + text.len());
        key.push_str(lang);
        key.push_str(KEY_SEPARATOR);
        key.push_str(text);
        key
    }

    /// 查询译文
    pub fn get(&self, lang: &str, text: &str) -> Option<String> {
        self.entries.get(&Self::cache_key(lang, text)).cloned()
    }

    pub fn contains(&self, lang: &str, text: &str) -> bool {
        self.entries.contains_key(&Self::cache_key(lang, text))
    }

    /// 写入译文（只在内存中，调用 `flush` 后落盘）
    pub fn put(&mut self, lang: &str, text: &str, translated: impl Into<String>) {
        self.entries
            .insert(Self::cache_key(lang, text), translated.into());
        self.stats.total_entries = self.entries.len();
        self.dirty = true;
    }

    /// 把内存状态写入持久化存储
    ///
    /// 尽力而为：失败只记录日志，不向调用方传播，内存中的条目仍然可用。
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }

        let serialized = match serde_json::to_string(&self.entries) {
            Ok(serialized) => serialized,
            Err(e) => {
                self.stats.failed_flushes += 1;
                TranslationError::from(e).log("序列化缓存失败");
                return;
            }
        };

        match self.store.write(&self.storage_key, &serialized) {
            Ok(()) => {
                self.dirty = false;
                self.stats.flushes += 1;
                tracing::debug!("缓存已落盘: {} 条", self.entries.len());
            }
            Err(e) => {
                self.stats.failed_flushes += 1;
                e.with_context(&self.storage_key).log("缓存落盘失败");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}
