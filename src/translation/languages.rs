//! 支持的语言列表
//!
//! 静态参考数据：语言代码、英文名、本地名、旗帜。书写方向由代码决定，
//! 只有 `ar` 是从右到左。

use std::fmt;

/// 切换进行中时语言指示器显示的文字
pub const LOADING_LABEL: &str = "\u{23f3} Translating\u{2026}";

/// 文档书写方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    /// 对应 `dir` 属性的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }

    pub fn for_code(code: &str) -> Self {
        if code == "ar" {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }
}

impl fmt::Display for TextDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 语言描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageDescriptor {
    pub code: &'static str,
    pub name: &'static str,
    pub native: &'static str,
    pub flag: &'static str,
}

impl LanguageDescriptor {
    pub fn direction(&self) -> TextDirection {
        TextDirection::for_code(self.code)
    }

    /// 语言指示器文字：旗帜 + 两个空格 + 本地名
    pub fn display_label(&self) -> String {
        format!("{}  {}", self.flag, self.native)
    }
}

#[rustfmt::skip]
pub const LANGUAGES: &[LanguageDescriptor] = &[
    LanguageDescriptor { code: "en", name: "English", native: "English", flag: "\u{1F1FA}\u{1F1F8}" },
    LanguageDescriptor { code: "es", name: "Spanish", native: "Espa\u{f1}ol", flag: "\u{1F1EA}\u{1F1F8}" },
    LanguageDescriptor { code: "zh-CN", name: "Chinese (Simplified)", native: "\u{7b80}\u{4f53}\u{4e2d}\u{6587}", flag: "\u{1F1E8}\u{1F1F3}" },
    LanguageDescriptor { code: "zh-TW", name: "Chinese (Traditional)", native: "\u{7e41}\u{9ad4}\u{4e2d}\u{6587}", flag: "\u{1F1F9}\u{1F1FC}" },
    LanguageDescriptor { code: "ar", name: "Arabic", native: "\u{627}\u{644}\u{639}\u{631}\u{628}\u{64a}\u{629}", flag: "\u{1F1F8}\u{1F1E6}" },
    LanguageDescriptor { code: "hi", name: "Hindi", native: "\u{939}\u{93f}\u{928}\u{94d}\u{926}\u{940}", flag: "\u{1F1EE}\u{1F1F3}" },
    LanguageDescriptor { code: "fr", name: "French", native: "Fran\u{e7}ais", flag: "\u{1F1EB}\u{1F1F7}" },
    LanguageDescriptor { code: "pt", name: "Portuguese", native: "Portugu\u{ea}s", flag: "\u{1F1E7}\u{1F1F7}" },
    LanguageDescriptor { code: "ru", name: "Russian", native: "\u{420}\u{443}\u{441}\u{441}\u{43a}\u{438}\u{439}", flag: "\u{1F1F7}\u{1F1FA}" },
    LanguageDescriptor { code: "ja", name: "Japanese", native: "\u{65e5}\u{672c}\u{8a9e}", flag: "\u{1F1EF}\u{1F1F5}" },
    LanguageDescriptor { code: "ko", name: "Korean", native: "\u{d55c}\u{ad6d}\u{c5b4}", flag: "\u{1F1F0}\u{1F1F7}" },
    LanguageDescriptor { code: "de", name: "German", native: "Deutsch", flag: "\u{1F1E9}\u{1F1EA}" },
];

/// 按代码查找语言（大小写敏感，与存储的偏好一致）
pub fn find_language(code: &str) -> Option<&'static LanguageDescriptor> {
    LANGUAGES.iter().find(|lang| lang.code == code)
}
