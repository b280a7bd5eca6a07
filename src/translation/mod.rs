//! 翻译模块
//!
//! 对一个持续变化的 HTML 文档做增量翻译，并能无损恢复原文：
//! - **storage**: 翻译缓存、语言偏好与持久化键值存储
//! - **core**: 翻译后端接口与批量翻译客户端
//! - **pipeline**: 发现过滤、原文登记表、DOM 同步
//! - **document / watcher**: 活动文档与变更防抖
//! - **controller / session**: 语言切换状态机与会话上下文
//! - **config / error / languages**: 配置、错误、支持的语言
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use live_translate::translation::{LiveDocument, TranslationConfig, TranslationSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = LiveDocument::parse("<html><body><p>Hello world</p></body></html>")?;
//! let mut session = TranslationSession::open(TranslationConfig::default(), document)?;
//! session.start().await?;
//! session.switch_language("es").await?;
//!
//! let body = session.document().body().expect("body");
//! session.document_mut().append_html(&body, "<p>Added later</p>")?;
//! session.settle().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 翻译后端与批量客户端
pub mod core;

/// 错误处理模块
pub mod error;

/// 发现与同步流水线
pub mod pipeline;

/// 缓存与偏好存储
pub mod storage;

pub mod controller;
pub mod document;
pub mod languages;
pub mod session;
pub mod watcher;

// ============================================================================
// 核心API导出
// ============================================================================

pub use config::{constants, ConfigManager, TranslationConfig};
pub use controller::{LanguageSwitchController, SessionState, SwitchPhase, SwitchTicket};
pub use core::{BatchRequest, BatchTranslationClient, HttpBackend, TranslationBackend};
pub use document::{LiveDocument, MutationRecord};
pub use error::{ErrorSeverity, TranslationError, TranslationResult};
pub use languages::{find_language, LanguageDescriptor, TextDirection, LANGUAGES, LOADING_LABEL};
pub use pipeline::{DomSynchronizer, OriginalTextRegistry, TextFilter, TranslatableAttr};
pub use session::{IncrementalOutcome, SwitchOutcome, TranslationSession};
pub use storage::{CacheStore, KeyValueStore, LanguagePreference, MemoryStore, RedbStore};
pub use watcher::MutationWatcher;

// ============================================================================
// 便利函数
// ============================================================================

/// 把一段 HTML 翻译到目标语言并返回序列化结果
///
/// 使用 HTTP 后端；配置了 `cache_path` 时缓存写入磁盘。
pub async fn translate_html(
    html: &str,
    target_lang: &str,
    config: TranslationConfig,
) -> TranslationResult<String> {
    let document = LiveDocument::parse(html)?;
    let mut session = TranslationSession::open(config, document)?;
    session.start().await?;
    session.switch_language(target_lang).await?;
    session.document().to_html()
}
