//! 批量翻译客户端
//!
//! 先查缓存，未命中的文本去重后按条数与字符总量分块，各分块并发调用翻译后端，
//! 结果按原始下标写回。某个分块失败时，该分块的文本回退为原文；回退结果不写缓存。
//! 返回值与输入一一对应、顺序一致，不会缺项。

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;

use crate::translation::config::TranslationConfig;
use crate::translation::core::backend::{BatchRequest, TranslationBackend};
use crate::translation::error::TranslationError;
use crate::translation::storage::CacheStore;

/// 客户端统计信息
#[derive(Debug, Default)]
pub struct ClientStats {
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,
    pub requests_sent: AtomicUsize,
    pub failed_chunks: AtomicUsize,
    pub identity_fallbacks: AtomicUsize,
    pub oversized_texts: AtomicUsize,
}

impl ClientStats {
    fn add(counter: &AtomicUsize, value: usize) {
        counter.fetch_add(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            failed_chunks: self.failed_chunks.load(Ordering::Relaxed),
            identity_fallbacks: self.identity_fallbacks.load(Ordering::Relaxed),
            oversized_texts: self.oversized_texts.load(Ordering::Relaxed),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub requests_sent: usize,
    pub failed_chunks: usize,
    pub identity_fallbacks: usize,
    pub oversized_texts: usize,
}

/// 一个目标语言下待请求的唯一文本及其在输入中的所有位置
struct PendingText<'t> {
    text: &'t str,
    slots: Vec<usize>,
}

/// 批量翻译客户端
#[derive(Clone)]
pub struct BatchTranslationClient {
    backend: Arc<dyn TranslationBackend>,
    cache: Arc<Mutex<CacheStore>>,
    source_lang: String,
    chunk_size: usize,
    max_text_chars: usize,
    max_request_chars: usize,
    stats: Arc<ClientStats>,
}

impl BatchTranslationClient {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        cache: CacheStore,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            backend,
            cache: Arc::new(Mutex::new(cache)),
            source_lang: config.source_lang.clone(),
            chunk_size: config.chunk_size.max(1),
            max_text_chars: config.max_text_chars,
            max_request_chars: config.max_request_chars,
            stats: Arc::new(ClientStats::default()),
        }
    }

    /// 翻译一组文本到目标语言
    ///
    /// 不返回错误：网络或存储失败都在内部记录日志并降级。
    pub async fn translate(&self, texts: &[String], target_lang: &str) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        if target_lang == self.source_lang {
            return texts.to_vec();
        }

        let mut results: Vec<Option<String>> = vec![None; texts.len()];
        let pending = self.resolve_from_cache(texts, target_lang, &mut results);

        if pending.is_empty() {
            tracing::debug!("{} 条文本全部命中缓存 ({})", texts.len(), target_lang);
            return Self::finish(results, texts);
        }

        let miss_texts: Vec<String> = pending.iter().map(|p| p.text.to_string()).collect();
        let chunks = self.plan_chunks(&miss_texts);
        tracing::debug!(
            "翻译 {} 条文本到 {}: {} 条未命中，分为 {} 个分块",
            texts.len(),
            target_lang,
            miss_texts.len(),
            chunks.len()
        );

        let requests = chunks.iter().map(|range| {
            let request = BatchRequest {
                texts: &miss_texts[range.clone()],
                target_language: target_lang,
                source_language: &self.source_lang,
            };
            self.backend.translate_batch(request)
        });
        ClientStats::add(&self.stats.requests_sent, chunks.len());
        let outcomes = join_all(requests).await;

        {
            let mut cache = self.lock_cache();
            for (range, outcome) in chunks.into_iter().zip(outcomes) {
                let translations = match outcome {
                    Ok(translations) if translations.len() == range.len() => translations,
                    Ok(translations) => {
                        self.chunk_failed(
                            TranslationError::ParseError(format!(
                                "译文数量 {} 与请求数量 {} 不一致",
                                translations.len(),
                                range.len()
                            )),
                            &range,
                        );
                        continue;
                    }
                    Err(e) => {
                        self.chunk_failed(e, &range);
                        continue;
                    }
                };

                for (entry, translated) in pending[range].iter().zip(translations) {
                    cache.put(target_lang, entry.text, translated.as_str());
                    for &slot in &entry.slots {
                        results[slot] = Some(translated.clone());
                    }
                }
            }
            cache.flush();
        }

        Self::finish(results, texts)
    }

    /// 查缓存，命中的直接写入结果；返回按首次出现顺序去重后的未命中文本
    fn resolve_from_cache<'t>(
        &self,
        texts: &'t [String],
        target_lang: &str,
        results: &mut [Option<String>],
    ) -> Vec<PendingText<'t>> {
        let cache = self.lock_cache();
        let mut pending: Vec<PendingText<'t>> = Vec::new();
        let mut positions: HashMap<&'t str, usize> = HashMap::new();
        let mut hits = 0;

        for (slot, text) in texts.iter().enumerate() {
            if let Some(hit) = cache.get(target_lang, text) {
                results[slot] = Some(hit);
                hits += 1;
                continue;
            }

            if text.chars().count() > self.max_text_chars {
                ClientStats::add(&self.stats.oversized_texts, 1);
                tracing::warn!(
                    "文本超过 {} 字符，保留原文: {:.40}",
                    self.max_text_chars,
                    text
                );
                continue;
            }

            match positions.get(text.as_str()) {
                Some(&index) => pending[index].slots.push(slot),
                None => {
                    positions.insert(text.as_str(), pending.len());
                    pending.push(PendingText {
                        text: text.as_str(),
                        slots: vec![slot],
                    });
                }
            }
        }

        ClientStats::add(&self.stats.cache_hits, hits);
        ClientStats::add(&self.stats.cache_misses, texts.len() - hits);
        pending
    }

    /// 按条数上限与字符总量上限切分
    fn plan_chunks(&self, texts: &[String]) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chars = 0;

        for (index, text) in texts.iter().enumerate() {
            let len = text.chars().count();
            let full = index - start >= self.chunk_size || chars + len > self.max_request_chars;
            if full && index > start {
                chunks.push(start..index);
                start = index;
                chars = 0;
            }
            chars += len;
        }

        if start < texts.len() {
            chunks.push(start..texts.len());
        }
        chunks
    }

    fn chunk_failed(&self, error: TranslationError, range: &Range<usize>) {
        ClientStats::add(&self.stats.failed_chunks, 1);
        error
            .with_context(format!("分块 {}..{}", range.start, range.end))
            .log("分块翻译失败，保留原文");
    }

    fn finish(results: Vec<Option<String>>, texts: &[String]) -> Vec<String> {
        results
            .into_iter()
            .zip(texts)
            .map(|(result, text)| result.unwrap_or_else(|| text.clone()))
            .collect()
    }

    fn lock_cache(&self) -> MutexGuard<'_, CacheStore> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn is_cached(&self, lang: &str, text: &str) -> bool {
        self.lock_cache().contains(lang, text)
    }

    pub fn stats(&self) -> ClientStatsSnapshot {
        self.stats.snapshot()
    }
}
