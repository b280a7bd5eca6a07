//! 翻译核心模块
//!
//! 外部翻译能力的接口与带缓存的批量翻译客户端。

pub mod backend;
pub mod client;

pub use backend::{BatchRequest, HttpBackend, TranslationBackend};
pub use client::{BatchTranslationClient, ClientStats, ClientStatsSnapshot};
