//! 语言切换控制器
//!
//! `Idle(L)` --选择 L'(≠L)--> `Loading(L')` --结果写回--> `Idle(L')`。
//! 进入 `Loading` 时立即更新当前语言、保存偏好、把指示器改成加载文字。
//! 每次切换领取一个递增的代号；当 `discard_stale` 打开时，代号过期的结果被丢弃。

use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::languages::{self, LOADING_LABEL};
use crate::translation::storage::LanguagePreference;

/// 一次切换（或一次增量翻译）的凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTicket {
    generation: u64,
    lang: String,
}

impl SwitchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchPhase {
    Idle,
    Loading { target: String },
}

/// 会话状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub current_lang: String,
    pub loading: bool,
    pub generation: u64,
}

pub struct LanguageSwitchController {
    baseline: String,
    current: String,
    phase: SwitchPhase,
    generation: u64,
    discard_stale: bool,
    preference: LanguagePreference,
    label: String,
}

impl LanguageSwitchController {
    pub fn new(baseline: &str, preference: LanguagePreference, discard_stale: bool) -> Self {
        Self {
            baseline: baseline.to_string(),
            current: baseline.to_string(),
            phase: SwitchPhase::Idle,
            generation: 0,
            discard_stale,
            preference,
            label: Self::label_for(baseline),
        }
    }

    fn label_for(code: &str) -> String {
        languages::find_language(code)
            .map(|lang| lang.display_label())
            .unwrap_or_else(|| code.to_string())
    }

    /// 启动时要恢复的语言：已保存、受支持且不是基准语言
    pub fn saved_preference(&self) -> Option<String> {
        let saved = self.preference.load()?;

        if languages::find_language(&saved).is_none() {
            tracing::warn!("忽略不支持的已保存语言: {}", saved);
            return None;
        }
        (saved != self.current).then_some(saved)
    }

    /// 用户选择语言
    ///
    /// 返回 `None` 表示已是当前语言，不做任何状态变化。
    pub fn request(&mut self, lang: &str) -> TranslationResult<Option<SwitchTicket>> {
        if languages::find_language(lang).is_none() {
            return Err(TranslationError::UnsupportedLanguage(lang.to_string()));
        }

        if lang == self.current {
            return Ok(None);
        }

        self.generation += 1;
        self.current = lang.to_string();
        self.phase = SwitchPhase::Loading {
            target: lang.to_string(),
        };
        self.label = LOADING_LABEL.to_string();
        self.preference.save(lang);

        tracing::info!("切换语言 -> {} (代号 {})", lang, self.generation);
        Ok(Some(SwitchTicket {
            generation: self.generation,
            lang: lang.to_string(),
        }))
    }

    /// 凭据是否仍可写回结果
    pub fn accepts(&self, ticket: &SwitchTicket) -> bool {
        !self.discard_stale || ticket.generation == self.generation
    }

    /// 切换结果返回；返回是否应写回
    ///
    /// 只有最新一次切换完成时才回到 `Idle` 并恢复指示器文字。
    pub fn finish(&mut self, ticket: &SwitchTicket) -> bool {
        let latest = ticket.generation == self.generation;

        if latest {
            self.phase = SwitchPhase::Idle;
            self.label = Self::label_for(&self.current);
        }

        if !self.accepts(ticket) {
            tracing::warn!(
                "丢弃过期的切换结果: {} (代号 {}，当前 {})",
                ticket.lang,
                ticket.generation,
                self.generation
            );
            return false;
        }
        true
    }

    /// 增量翻译使用的凭据，绑定当前语言与代号
    pub fn incremental_ticket(&self) -> SwitchTicket {
        SwitchTicket {
            generation: self.generation,
            lang: self.current.clone(),
        }
    }

    pub fn is_baseline(&self, lang: &str) -> bool {
        lang == self.baseline
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn current_lang(&self) -> &str {
        &self.current
    }

    pub fn phase(&self) -> &SwitchPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SwitchPhase::Loading { .. })
    }

    /// 语言指示器当前显示的文字
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            current_lang: self.current.clone(),
            loading: self.is_loading(),
            generation: self.generation,
        }
    }
}
