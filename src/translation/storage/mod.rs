//! 存储模块
//!
//! 提供翻译缓存、语言偏好以及它们共用的持久化键值存储。

pub mod cache;
pub mod kv;
pub mod preferences;

pub use cache::{CacheStats, CacheStore};
pub use kv::{KeyValueStore, MemoryStore, RedbStore};
pub use preferences::LanguagePreference;
