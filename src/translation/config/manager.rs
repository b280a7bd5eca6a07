//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::languages;

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub source_lang: String,
    pub api_url: String,
    pub request_timeout_secs: u64,

    // 分块配置
    pub chunk_size: usize,
    pub max_texts_per_request: usize,
    pub max_text_chars: usize,
    pub max_request_chars: usize,

    // 变更观察
    pub debounce_ms: u64,

    // 持久化配置
    pub cache_path: Option<String>,
    pub cache_namespace: String,
    pub cache_version: u32,
    pub preference_key: String,

    // 行为开关
    pub discard_stale_results: bool,
    pub excluded_marker: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            max_texts_per_request: constants::MAX_TEXTS_PER_REQUEST,
            max_text_chars: constants::DEFAULT_MAX_TEXT_CHARS,
            max_request_chars: constants::DEFAULT_MAX_REQUEST_CHARS,

            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,

            cache_path: None,
            cache_namespace: constants::DEFAULT_CACHE_NAMESPACE.to_string(),
            cache_version: constants::DEFAULT_CACHE_VERSION,
            preference_key: constants::DEFAULT_PREFERENCE_KEY.to_string(),

            discard_stale_results: true,
            excluded_marker: constants::DEFAULT_EXCLUDED_MARKER.to_string(),
        }
    }
}

impl TranslationConfig {
    /// 创建带指定 API 地址的默认配置
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            ..Self::default()
        }
    }

    /// 从 TOML 文本解析配置，缺省字段取默认值
    pub fn from_toml_str(content: &str) -> TranslationResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.source_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("基准语言不能为空".to_string()));
        }

        if languages::find_language(&self.source_lang).is_none() {
            return Err(TranslationError::ConfigError(format!(
                "基准语言 '{}' 不在支持列表中",
                self.source_lang
            )));
        }

        let url = url::Url::parse(&self.api_url)
            .map_err(|e| TranslationError::ConfigError(format!("API 地址无效: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TranslationError::ConfigError(
                "API 地址必须使用 http 或 https".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(TranslationError::ConfigError("分块大小不能为0".to_string()));
        }

        if self.max_texts_per_request > constants::MAX_TEXTS_PER_REQUEST {
            return Err(TranslationError::ConfigError(format!(
                "每次请求最多 {} 条文本",
                constants::MAX_TEXTS_PER_REQUEST
            )));
        }

        if self.chunk_size > self.max_texts_per_request {
            return Err(TranslationError::ConfigError(format!(
                "分块大小 {} 超过单次请求上限 {}",
                self.chunk_size, self.max_texts_per_request
            )));
        }

        if self.max_text_chars == 0 || self.max_request_chars == 0 {
            return Err(TranslationError::ConfigError("字符上限不能为0".to_string()));
        }

        if self.max_text_chars > self.max_request_chars {
            return Err(TranslationError::ConfigError(
                "单条文本上限不能超过单次请求总上限".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        if self.cache_namespace.is_empty() || self.preference_key.is_empty() {
            return Err(TranslationError::ConfigError("持久化键不能为空".to_string()));
        }

        if self.excluded_marker.is_empty() {
            return Err(TranslationError::ConfigError("排除标记不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, translation, EnvVar};

        if let Ok(source_lang) = translation::SourceLang::get() {
            self.source_lang = source_lang;
        }

        if let Ok(api_url) = translation::ApiUrl::get() {
            self.api_url = api_url;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }

        if let Ok(chunk_size) = translation::ChunkSize::get() {
            self.chunk_size = chunk_size;
        }

        if let Ok(timeout) = translation::RequestTimeout::get() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Ok(debounce) = translation::Debounce::get() {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Ok(discard) = translation::DiscardStale::get() {
            self.discard_stale_results = discard;
        }

        if let Ok(path) = cache::Path::get() {
            self.cache_path = Some(path);
        }

        if let Ok(version) = cache::Version::get() {
            self.cache_version = version;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 缓存在持久化存储中的键，带版本号
    pub fn cache_storage_key(&self) -> String {
        format!("{}:v{}", self.cache_namespace, self.cache_version)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量 → 校验
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 使用指定配置文件
    pub fn from_path(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let config = Self::load_from_file(expanded.as_ref())?;
        Self::finish(config)
    }

    fn finish(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 在搜索路径中查找配置文件
    fn load_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置（按扩展名识别 TOML / JSON）
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        if !Path::new(path).exists() {
            return Err(TranslationError::ConfigError(format!(
                "配置文件不存在: {}",
                path
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(true))
            .build()?;

        Ok(settings.try_deserialize::<TranslationConfig>()?)
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
