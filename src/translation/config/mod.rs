//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 基准语言：文档原始撰写语言
    pub const DEFAULT_SOURCE_LANG: &str = "en";

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:5001/translateText";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 分块与请求上限（翻译服务端硬限制为每次 128 条）
    pub const DEFAULT_CHUNK_SIZE: usize = 100;
    pub const MAX_TEXTS_PER_REQUEST: usize = 128;
    pub const DEFAULT_MAX_TEXT_CHARS: usize = 5_000;
    pub const DEFAULT_MAX_REQUEST_CHARS: usize = 500_000;

    // 变更观察
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;

    // 持久化键
    pub const DEFAULT_CACHE_NAMESPACE: &str = "lt_cache";
    pub const DEFAULT_CACHE_VERSION: u32 = 1;
    pub const DEFAULT_PREFERENCE_KEY: &str = "lt_lang";

    // 排除区域标记
    pub const DEFAULT_EXCLUDED_MARKER: &str = "data-no-translate";

    // 文本子节点不参与翻译的元素
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "code", "pre"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "live-translate.toml",
        ".live-translate.toml",
        "~/.config/live-translate/config.toml",
        "/etc/live-translate/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}
