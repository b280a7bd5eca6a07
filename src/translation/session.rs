//! 翻译会话
//!
//! 一个页面会话的全部状态：文档、原文登记表、同步器、批量翻译客户端、
//! 切换控制器与变更观察器。切换语言和增量翻译都分成 `begin_*` / `complete_*`
//! 两步，中间的网络请求由调用方等待，因此多次切换可以交错完成。

use std::sync::Arc;

use tokio::time::Instant;

use crate::translation::config::TranslationConfig;
use crate::translation::controller::{LanguageSwitchController, SessionState, SwitchTicket};
use crate::translation::core::{BatchTranslationClient, HttpBackend, TranslationBackend};
use crate::translation::document::LiveDocument;
use crate::translation::error::TranslationResult;
use crate::translation::languages::TextDirection;
use crate::translation::pipeline::{
    ApplyReport, Discovery, DomSynchronizer, OriginalTextRegistry, TranslationJob,
};
use crate::translation::storage::{
    CacheStore, KeyValueStore, LanguagePreference, MemoryStore, RedbStore,
};
use crate::translation::watcher::MutationWatcher;

/// 等待翻译结果的切换
#[derive(Debug)]
pub struct PendingSwitch {
    pub ticket: SwitchTicket,
    pub job: TranslationJob,
}

/// `begin_switch` 的结果
#[derive(Debug)]
pub enum SwitchStep {
    /// 已是当前语言
    Unchanged,
    /// 切回基准语言，已同步恢复
    Restored(ApplyReport),
    /// 需要翻译
    Pending(PendingSwitch),
}

/// 切换的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Unchanged,
    Restored(ApplyReport),
    Applied(ApplyReport),
    Stale,
}

/// 等待翻译结果的增量内容
#[derive(Debug)]
pub struct PendingIncremental {
    pub ticket: SwitchTicket,
    pub job: TranslationJob,
}

/// `begin_incremental` 的结果
#[derive(Debug)]
pub enum IncrementalStep {
    /// 防抖窗口未到期
    Waiting,
    /// 到期但没有新内容
    NothingNew,
    /// 当前为基准语言，新内容只登记不翻译
    Baseline { discovered: usize },
    Pending(PendingIncremental),
}

/// 增量翻译的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalOutcome {
    Waiting,
    NothingNew,
    Baseline { discovered: usize },
    Applied(ApplyReport),
    Stale,
}

pub struct TranslationSession {
    config: TranslationConfig,
    document: LiveDocument,
    registry: OriginalTextRegistry,
    synchronizer: DomSynchronizer,
    client: BatchTranslationClient,
    controller: LanguageSwitchController,
    watcher: MutationWatcher,
}

impl TranslationSession {
    /// 使用给定的翻译后端和持久化存储创建会话
    pub fn new(
        config: TranslationConfig,
        document: LiveDocument,
        backend: Arc<dyn TranslationBackend>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cache = CacheStore::load(Arc::clone(&store), config.cache_storage_key());
        let preference = LanguagePreference::new(store, config.preference_key.clone());

        Self {
            registry: OriginalTextRegistry::new(),
            synchronizer: DomSynchronizer::new(&config),
            client: BatchTranslationClient::new(backend, cache, &config),
            controller: LanguageSwitchController::new(
                &config.source_lang,
                preference,
                config.discard_stale_results,
            ),
            watcher: MutationWatcher::new(config.debounce()),
            document,
            config,
        }
    }

    /// 按配置打开会话：HTTP 后端，配置了 `cache_path` 时使用磁盘存储
    pub fn open(config: TranslationConfig, document: LiveDocument) -> TranslationResult<Self> {
        let backend: Arc<dyn TranslationBackend> = Arc::new(HttpBackend::new(&config)?);

        let store: Arc<dyn KeyValueStore> = match &config.cache_path {
            Some(path) => {
                let expanded = shellexpand::tilde(path).into_owned();
                Arc::new(RedbStore::open(&expanded)?)
            }
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::new(config, document, backend, store))
    }

    /// 初次发现，然后恢复上次选择的语言
    pub async fn start(&mut self) -> TranslationResult<SwitchOutcome> {
        let discovery = self.discover();
        self.document.take_records();
        tracing::info!(
            "初始扫描: {} 个文本节点、{} 个属性",
            discovery.texts.len(),
            discovery.attrs.len()
        );

        match self.controller.saved_preference() {
            Some(lang) => {
                tracing::info!("恢复已保存的语言: {}", lang);
                self.switch_language(&lang).await
            }
            None => Ok(SwitchOutcome::Unchanged),
        }
    }

    fn discover(&mut self) -> Discovery {
        let root = self.document.scan_root();
        self.synchronizer.collect(&root, &mut self.registry)
    }

    /// 切换语言并等待完成
    pub async fn switch_language(&mut self, lang: &str) -> TranslationResult<SwitchOutcome> {
        let pending = match self.begin_switch(lang)? {
            SwitchStep::Unchanged => return Ok(SwitchOutcome::Unchanged),
            SwitchStep::Restored(report) => return Ok(SwitchOutcome::Restored(report)),
            SwitchStep::Pending(pending) => pending,
        };

        let client = self.client.clone();
        let translations = client.translate(&pending.job.texts, pending.ticket.lang()).await;
        Ok(self.complete_switch(pending, &translations))
    }

    /// 切换的同步部分：更新状态、补充发现，基准语言直接恢复
    pub fn begin_switch(&mut self, lang: &str) -> TranslationResult<SwitchStep> {
        let Some(ticket) = self.controller.request(lang)? else {
            return Ok(SwitchStep::Unchanged);
        };

        self.registry.prune();
        self.discover();

        if self.controller.is_baseline(lang) {
            let report = self.synchronizer.restore_all(&self.registry);
            self.document.set_direction(TextDirection::Ltr);
            self.controller.finish(&ticket);
            tracing::info!("已恢复原文: {} 处", report.applied);
            return Ok(SwitchStep::Restored(report));
        }

        let job = self.synchronizer.snapshot_all(&self.registry);
        Ok(SwitchStep::Pending(PendingSwitch { ticket, job }))
    }

    /// 切换的写回部分
    pub fn complete_switch(
        &mut self,
        pending: PendingSwitch,
        translations: &[String],
    ) -> SwitchOutcome {
        if !self.controller.finish(&pending.ticket) {
            return SwitchOutcome::Stale;
        }

        let report = self
            .synchronizer
            .apply(&self.registry, &pending.job, translations);
        self.document
            .set_direction(TextDirection::for_code(pending.ticket.lang()));

        tracing::info!(
            "已切换到 {}: 写回 {} 处，跳过 {} 处",
            pending.ticket.lang(),
            report.applied,
            report.skipped
        );
        SwitchOutcome::Applied(report)
    }

    /// 把文档积压的变更记录交给观察器
    pub fn observe_mutations(&mut self, now: Instant) {
        let records = self.document.take_records();
        self.watcher.observe_records(&records, now);
    }

    /// 增量翻译的同步部分：防抖到期后只发现尚未登记的内容
    pub fn begin_incremental(&mut self, now: Instant) -> IncrementalStep {
        self.observe_mutations(now);
        if !self.watcher.poll(now) {
            return IncrementalStep::Waiting;
        }

        self.registry.prune();
        let discovery = self.discover();
        if discovery.is_empty() {
            return IncrementalStep::NothingNew;
        }

        if self.controller.is_baseline(self.controller.current_lang()) {
            tracing::debug!("基准语言下新增 {} 处内容，无需翻译", discovery.len());
            return IncrementalStep::Baseline {
                discovered: discovery.len(),
            };
        }

        let job = self.synchronizer.snapshot(&self.registry, &discovery);
        IncrementalStep::Pending(PendingIncremental {
            ticket: self.controller.incremental_ticket(),
            job,
        })
    }

    /// 增量翻译的写回部分，只触及本次新发现的节点
    pub fn complete_incremental(
        &mut self,
        pending: PendingIncremental,
        translations: &[String],
    ) -> IncrementalOutcome {
        if !self.controller.accepts(&pending.ticket) {
            tracing::warn!(
                "丢弃过期的增量结果: {} (代号 {})",
                pending.ticket.lang(),
                pending.ticket.generation()
            );
            return IncrementalOutcome::Stale;
        }

        let report = self
            .synchronizer
            .apply(&self.registry, &pending.job, translations);
        tracing::debug!("增量翻译写回 {} 处", report.applied);
        IncrementalOutcome::Applied(report)
    }

    /// 在 `now` 时刻检查一次观察器，到期则完成一次增量翻译
    pub async fn pump(&mut self, now: Instant) -> IncrementalOutcome {
        let pending = match self.begin_incremental(now) {
            IncrementalStep::Waiting => return IncrementalOutcome::Waiting,
            IncrementalStep::NothingNew => return IncrementalOutcome::NothingNew,
            IncrementalStep::Baseline { discovered } => {
                return IncrementalOutcome::Baseline { discovered }
            }
            IncrementalStep::Pending(pending) => pending,
        };

        let client = self.client.clone();
        let translations = client.translate(&pending.job.texts, pending.ticket.lang()).await;
        self.complete_incremental(pending, &translations)
    }

    /// 等待防抖窗口结束并处理积压的变更
    pub async fn settle(&mut self) -> IncrementalOutcome {
        self.observe_mutations(Instant::now());

        let Some(deadline) = self.watcher.deadline() else {
            return IncrementalOutcome::Waiting;
        };
        tokio::time::sleep_until(deadline).await;
        self.pump(Instant::now().max(deadline)).await
    }

    pub fn document(&self) -> &LiveDocument {
        &self.document
    }

    /// 修改文档结构须经过这里，变更记录由观察器消费
    pub fn document_mut(&mut self) -> &mut LiveDocument {
        &mut self.document
    }

    pub fn registry(&self) -> &OriginalTextRegistry {
        &self.registry
    }

    pub fn client(&self) -> &BatchTranslationClient {
        &self.client
    }

    pub fn controller(&self) -> &LanguageSwitchController {
        &self.controller
    }

    pub fn watcher(&self) -> &MutationWatcher {
        &self.watcher
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn current_lang(&self) -> &str {
        self.controller.current_lang()
    }

    pub fn label(&self) -> &str {
        self.controller.label()
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }
}
