// 集成测试公共模块
//
// 提供可观测的模拟翻译后端与测试文档

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;

use live_translate::translation::{
    BatchRequest, KeyValueStore, LiveDocument, MemoryStore, TranslationBackend,
    TranslationConfig, TranslationError, TranslationResult, TranslationSession,
};

/// 模拟后端收到的一次请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub texts: Vec<String>,
    pub target: String,
    pub source: String,
}

/// 模拟翻译后端
///
/// 默认把 `text` 翻译成 `"[lang] text"`；可以指定词典、让包含某段文本的分块失败、
/// 让包含某段文本的分块延迟返回，或故意少返回一条译文。
#[derive(Default)]
pub struct MockBackend {
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    dictionary: HashMap<(String, String), String>,
    fail_on: HashSet<String>,
    delays: HashMap<String, Duration>,
    truncate: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, lang: &str, text: &str, translated: &str) -> Self {
        self.dictionary
            .insert((lang.to_string(), text.to_string()), translated.to_string());
        self
    }

    /// 请求中包含 `text` 时整个分块失败
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.insert(text.to_string());
        self
    }

    /// 请求中包含 `text` 时延迟返回
    pub fn delaying(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// 每次少返回一条译文
    pub fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn translate_one(&self, lang: &str, text: &str) -> String {
        self.dictionary
            .get(&(lang.to_string(), text.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", lang, text))
    }
}

impl TranslationBackend for MockBackend {
    fn translate_batch<'a>(
        &'a self,
        request: BatchRequest<'a>,
    ) -> BoxFuture<'a, TranslationResult<Vec<String>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(RecordedRequest {
                texts: request.texts.to_vec(),
                target: request.target_language.to_string(),
                source: request.source_language.to_string(),
            });

            let delay = request
                .texts
                .iter()
                .filter_map(|text| self.delays.get(text))
                .max()
                .copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if request.texts.iter().any(|text| self.fail_on.contains(text)) {
                return Err(TranslationError::NetworkError("mock failure".to_string()));
            }

            let mut translations: Vec<String> = request
                .texts
                .iter()
                .map(|text| self.translate_one(request.target_language, text))
                .collect();
            if self.truncate {
                translations.pop();
            }
            Ok(translations)
        })
    }
}

pub fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|text| text.to_string()).collect()
}

pub fn test_config() -> TranslationConfig {
    TranslationConfig::with_api_url("http://127.0.0.1:9/translateText")
}

pub const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Docs</title></head>
<body>
  <nav data-no-translate><a href="/">Brand Name</a></nav>
  <h1 id="title">Welcome to the guide</h1>
  <p id="intro">Read this first</p>
  <p id="price">$ 19.99</p>
  <pre>cargo build --release</pre>
  <input id="search" placeholder="Search the docs" aria-label="Search">
  <button id="save" title="Save changes">Save</button>
</body>
</html>"#;

/// 基于模拟后端的会话
pub fn session_with(
    backend: Arc<MockBackend>,
    config: TranslationConfig,
    store: Arc<dyn KeyValueStore>,
) -> TranslationSession {
    let document = LiveDocument::parse(PAGE).unwrap();
    TranslationSession::new(config, document, backend, store)
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}
