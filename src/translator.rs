//! 请求分发模块
//!
//! 把一个 [`TranslationRequest`] 变成恰好一次聊天补全调用，并把返回结果统一为
//! [`TranslationResult`]。这里不做重试，失败如何处理由调用方决定。

// 标准库导入
use std::sync::Arc;
use std::time::Instant;

// 第三方crate导入
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::api_config;
use crate::config::TranslatorConfig;
use crate::error::{Result, TranslationError};
use crate::prompts::system_instruction;
use crate::settings::{load_api_key, load_settings, SettingsStore};
use crate::translation_error;
use crate::types::{Mode, TranslationRequest, TranslationResult};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// 绑定端点与设置存储的请求分发器
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    config: TranslatorConfig,
    store: Arc<dyn SettingsStore>,
}

impl Dispatcher {
    /// 构建HTTP客户端并验证端点URL
    pub fn new(config: TranslatorConfig, store: Arc<dyn SettingsStore>) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| translation_error!(network, format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            store,
        })
    }

    /// 端点配置
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 读取当前风格与程度，然后以 `mode` 分发 `text`
    pub async fn handle(&self, mode: Mode, text: &str) -> TranslationResult {
        let settings = match load_settings(self.store.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => return e.into(),
        };

        let (style, level) = settings.style_level(mode);
        match TranslationRequest::new(text, mode, style, level) {
            Ok(request) => self.dispatch(&request).await,
            Err(e) => e.into(),
        }
    }

    /// 发送一个请求并归一化结果
    pub async fn dispatch(&self, request: &TranslationRequest) -> TranslationResult {
        let started = Instant::now();
        let result = self.try_dispatch(request).await;

        match &result {
            Ok(text) => info!(
                "{} finished in {}ms ({} -> {} chars)",
                request.mode.as_str(),
                started.elapsed().as_millis(),
                request.text().chars().count(),
                text.chars().count()
            ),
            Err(e) => warn!("{} failed: {}", request.mode.as_str(), e),
        }

        result.into()
    }

    async fn try_dispatch(&self, request: &TranslationRequest) -> Result<String> {
        let api_key = load_api_key(self.store.as_ref())
            .await?
            .ok_or(TranslationError::MissingCredential)?;

        let instruction = system_instruction(request.mode, request.style, request.level);
        debug!(
            "dispatching {} with style={} level={}",
            request.mode.as_str(),
            request.style,
            request.level
        );

        let messages = vec![
            ChatMessage {
                role: "system",
                content: &instruction,
            },
            ChatMessage {
                role: "user",
                content: request.text(),
            },
        ];

        let text = self
            .complete(&api_key, messages, self.config.max_tokens())
            .await?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TranslationError::EmptyResult);
        }
        Ok(trimmed.to_string())
    }

    /// 保存前用最小补全请求校验密钥
    pub async fn verify_credential(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(TranslationError::MissingCredential);
        }

        let messages = vec![
            ChatMessage {
                role: "system",
                content: "You are a helpful assistant.",
            },
            ChatMessage {
                role: "user",
                content: "Hello",
            },
        ];
        self.complete(api_key, messages, api_config::VERIFY_MAX_TOKENS)
            .await?;
        info!("API key verified against {}", self.config.api_url());
        Ok(())
    }

    async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage<'_>>,
        max_tokens: u32,
    ) -> Result<String> {
        let body = ChatRequest {
            messages,
            model: self.config.model(),
            temperature: self.config.temperature(),
            max_tokens,
        };

        let response = self
            .client
            .post(self.config.api_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(translation_error!(
                endpoint,
                status.as_u16(),
                endpoint_error_message(status, &response_text)
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            translation_error!(
                endpoint,
                status.as_u16(),
                format!("invalid response body: {}", e)
            )
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// 端点返回的 `error.message`，否则为 `API error: <status>`
fn endpoint_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("API error: {}", status.as_u16()))
}
