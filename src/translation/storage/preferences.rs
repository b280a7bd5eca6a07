//! 用户语言偏好
//!
//! 启动时读取一次，每次切换语言时写入。读写失败只记录日志。

use std::sync::Arc;

use crate::translation::storage::kv::KeyValueStore;

pub struct LanguagePreference {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LanguagePreference {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// 读取上次选择的语言
    pub fn load(&self) -> Option<String> {
        match self.store.read(&self.key) {
            Ok(value) => value.filter(|code| !code.trim().is_empty()),
            Err(e) => {
                e.log("读取语言偏好失败");
                None
            }
        }
    }

    /// 保存当前选择的语言
    pub fn save(&self, code: &str) {
        if let Err(e) = self.store.write(&self.key, code) {
            e.log("保存语言偏好失败");
        }
    }
}
