//! # live-translate
//!
//! 增量翻译活动 HTML 文档的工具库：去重、缓存、分块并发请求外部翻译服务，
//! 把译文写回文本节点与属性，并能随时恢复到原文。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、节点操作与序列化
//! - `translation` - 缓存、批量翻译、原文登记、DOM 同步、变更观察、语言切换
//! - `env` - 类型安全的环境变量

pub mod env;
pub mod parsers;
pub mod translation;

pub use parsers::*;
pub use translation::{
    LiveDocument, TranslationConfig, TranslationError, TranslationResult, TranslationSession,
};
