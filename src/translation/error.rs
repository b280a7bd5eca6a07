//! 翻译模块统一错误处理
//!
//! 只有初始化类操作（加载配置、打开存储、解析输入、未知语言）会把错误交给调用方；
//! 翻译、应用、落盘这些运行期操作在内部记录日志后降级处理。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 不支持的语言
    #[error("不支持的语言: {0}")]
    UnsupportedLanguage(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::UnsupportedLanguage(_) => ErrorSeverity::Info,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::ConfigError(msg) => TranslationError::ConfigError(wrap(msg)),
            TranslationError::NetworkError(msg) => TranslationError::NetworkError(wrap(msg)),
            TranslationError::InvalidInput(msg) => TranslationError::InvalidInput(wrap(msg)),
            TranslationError::CacheError(msg) => TranslationError::CacheError(wrap(msg)),
            TranslationError::ParseError(msg) => TranslationError::ParseError(wrap(msg)),
            TranslationError::SerializationError(msg) => {
                TranslationError::SerializationError(wrap(msg))
            }
            TranslationError::UnsupportedLanguage(msg) => {
                TranslationError::UnsupportedLanguage(wrap(msg))
            }
            TranslationError::InternalError(msg) => TranslationError::InternalError(wrap(msg)),
        }
    }

    /// 按严重程度记录日志，用于不向调用方传播的错误
    pub fn log(&self, what: &str) {
        match self.severity() {
            ErrorSeverity::Info => tracing::info!("{}: {}", what, self),
            ErrorSeverity::Warning => tracing::warn!("{}: {}", what, self),
            ErrorSeverity::Error | ErrorSeverity::Critical => tracing::error!("{}: {}", what, self),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::ParseError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::ConfigError(format!("配置错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::ParseError(format!("响应解析失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<redb::Error> for TranslationError {
    fn from(error: redb::Error) -> Self {
        TranslationError::CacheError(format!("存储错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;
