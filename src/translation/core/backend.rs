//! 翻译服务接口
//!
//! 客户端只依赖 `TranslationBackend`；`HttpBackend` 是对接外部批量翻译接口的实现，
//! 请求体为 `{texts, targetLanguage, sourceLanguage}`，响应体为 `{translations}`。

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 单次批量翻译请求
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest<'a> {
    pub texts: &'a [String],
    pub target_language: &'a str,
    pub source_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    translations: Vec<String>,
}

/// 外部批量翻译能力
///
/// 返回的译文必须与请求文本一一对应；任何错误都会让调用方对整个分块使用原文。
pub trait TranslationBackend: Send + Sync {
    fn translate_batch<'a>(
        &'a self,
        request: BatchRequest<'a>,
    ) -> BoxFuture<'a, TranslationResult<Vec<String>>>;
}

/// HTTP JSON 翻译后端
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn send(&self, request: BatchRequest<'_>) -> TranslationResult<Vec<String>> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::NetworkError(format!(
                "翻译服务返回状态 {}",
                status
            )));
        }

        let body: BatchResponse = response.json().await?;
        if body.translations.len() != request.texts.len() {
            return Err(TranslationError::ParseError(format!(
                "译文数量 {} 与请求数量 {} 不一致",
                body.translations.len(),
                request.texts.len()
            )));
        }

        Ok(body.translations)
    }
}

impl TranslationBackend for HttpBackend {
    fn translate_batch<'a>(
        &'a self,
        request: BatchRequest<'a>,
    ) -> BoxFuture<'a, TranslationResult<Vec<String>>> {
        Box::pin(self.send(request))
    }
}
