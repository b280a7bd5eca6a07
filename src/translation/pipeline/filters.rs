//! 文本过滤器模块
//!
//! 判断一段文本是否值得翻译：去除首尾空白后至少两个字符，且不能只由数字、
//! 标点、符号组成。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

/// 只含数字、标点、符号和空白
const SYMBOLS_ONLY_PATTERN: &str = r"^[\p{N}\p{P}\p{S}\s]+$";

/// 文本过滤器
#[derive(Default)]
pub struct TextFilter {
    symbols_only: OnceLock<Option<Regex>>,
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        let trimmed = text.trim();

        if trimmed.chars().count() < constants::MIN_TEXT_LENGTH {
            return false;
        }

        !self.is_symbols_only(trimmed)
    }

    /// 检查是否为纯符号或数字
    fn is_symbols_only(&self, text: &str) -> bool {
        let regex = self
            .symbols_only
            .get_or_init(|| Regex::new(SYMBOLS_ONLY_PATTERN).ok());

        match regex {
            Some(regex) => regex.is_match(text),
            None => text
                .chars()
                .all(|c| c.is_numeric() || c.is_ascii_punctuation() || c.is_whitespace()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_and_blank() {
        let filter = TextFilter::new();
        assert!(!filter.should_translate(""));
        assert!(!filter.should_translate("   \n\t "));
        assert!(!filter.should_translate(" a "));
        assert!(filter.should_translate(" OK "));
    }

    #[test]
    fn test_rejects_symbols_and_digits() {
        let filter = TextFilter::new();
        assert!(!filter.should_translate("42"));
        assert!(!filter.should_translate("$ 1,299.00"));
        assert!(!filter.should_translate("--- | ---"));
        assert!(!filter.should_translate("\u{2192} \u{00a9} 2024"));
    }

    #[test]
    fn test_accepts_linguistic_content() {
        let filter = TextFilter::new();
        assert!(filter.should_translate("Hello, world!"));
        assert!(filter.should_translate("3 items left"));
        assert!(filter.should_translate("\u{4f60}\u{597d}"));
        assert!(filter.should_translate("\u{645}\u{631}\u{62d}\u{628}\u{627}"));
    }}
