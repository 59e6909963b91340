//! 文本处理服务 - 业务能力层
//!
//! 只负责"文本进、文本出"，不关心表格
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 默认对接 Vertex AI 的 OpenAI 兼容端点（Gemini）
//! - 也可指向任意兼容 OpenAI API 的服务

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ProcessingError;
use crate::infrastructure::TokenSource;

/// 文本处理能力
#[async_trait]
pub trait TextProcessor: Send + Sync {
    async fn process(&self, text: &str) -> Result<String, ProcessingError>;
}

/// 构建固定提示词：指令 + 原文 + 回答标记
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"请分析以下文本，并进行总结和整理。

文本：
{}

回答："#,
        text
    )
}

/// 生成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl GenerationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_output_tokens: config.llm_max_output_tokens,
            temperature: config.llm_temperature,
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }
}

/// LLM 服务
///
/// 职责：
/// - 用固定提示词包装输入文本
/// - 调用 LLM 并返回去掉首尾空白的结果
/// - 超时或失败时返回 `ProcessingError`，不重试
pub struct LlmService {
    api_base_url: String,
    model_name: String,
    /// API Key 或访问令牌，每次调用时获取
    credentials: Arc<dyn TokenSource>,
    /// 与当前令牌绑定的客户端，令牌变化时才重建
    client: Mutex<Option<(String, Client<OpenAIConfig>)>>,
    options: GenerationOptions,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, credentials: Arc<dyn TokenSource>) -> Self {
        Self {
            api_base_url: config.llm_base_url(),
            model_name: config.llm_model_name.clone(),
            credentials,
            client: Mutex::new(None),
            options: GenerationOptions::from_config(config),
        }
    }

    /// 取得当前令牌对应的客户端
    ///
    /// 令牌未变时复用同一个客户端（连接池随之复用）
    async fn client(&self) -> Result<Client<OpenAIConfig>, ProcessingError> {
        let token = self.credentials.access_token().await?;

        let mut slot = self.client.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_token, client)) = slot.as_ref() {
            if *cached_token == token {
                return Ok(client.clone());
            }
        }

        debug!("创建 LLM 客户端: {}", self.api_base_url);
        let openai_config = OpenAIConfig::new()
            .with_api_key(token.clone())
            .with_api_base(&self.api_base_url);
        let client = Client::with_config(openai_config);
        *slot = Some((token, client.clone()));

        Ok(client)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容（完整提示词）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(&self, user_message: &str) -> Result<String, ProcessingError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let client = self.client().await?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(ProcessingError::BuildRequest)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(self.options.temperature)
            .max_tokens(self.options.max_output_tokens)
            .build()
            .map_err(ProcessingError::BuildRequest)?;

        let response = tokio::time::timeout(self.options.timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({} 秒)", self.options.timeout.as_secs());
                ProcessingError::Timeout {
                    model: self.model_name.clone(),
                    secs: self.options.timeout.as_secs(),
                }
            })?
            .map_err(|source| {
                warn!("LLM API 调用失败: {}", source);
                ProcessingError::ApiCallFailed {
                    model: self.model_name.clone(),
                    source,
                }
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProcessingError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }
}

#[async_trait]
impl TextProcessor for LlmService {
    async fn process(&self, text: &str) -> Result<String, ProcessingError> {
        info!(
            "🤖 LLM 处理开始: model={}, text_length={}",
            self.model_name,
            text.chars().count()
        );

        let result = self.send_to_llm(&build_prompt(text)).await?;

        info!("✓ LLM 处理完成: result_length={}", result.chars().count());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::serve;
    use crate::infrastructure::StaticToken;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 0,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop",
                "logprobs": null
            }]
        })
    }

    /// 本地 OpenAI 兼容端点：延迟 `delay` 后回复 `reply`，并记录收到的请求
    async fn llm_server(
        reply: &'static str,
        delay: Duration,
    ) -> (Config, Arc<Mutex<Vec<Value>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(requests): State<Arc<Mutex<Vec<Value>>>>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        requests
                            .lock()
                            .unwrap()
                            .push(json!({"auth": auth, "body": body}));
                        tokio::time::sleep(delay).await;
                        Json(completion(reply))
                    },
                ),
            )
            .with_state(requests.clone());

        let base = serve(router).await;
        let mut config = Config::default();
        config.llm_api_base_url = Some(format!("{}/v1", base));
        config.llm_model_name = "test-model".into();
        config.llm_timeout_secs = 1;
        (config, requests)
    }

    /// 每次调用返回新令牌 `k-n`
    struct RotatingToken(AtomicUsize);

    #[async_trait]
    impl TokenSource for RotatingToken {
        async fn access_token(&self) -> Result<String, crate::error::CredentialError> {
            Ok(format!("k-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    #[test]
    fn test_prompt_wraps_text() {
        let prompt = build_prompt("hello");
        assert!(prompt.starts_with("请分析以下文本"));
        assert!(prompt.contains("\nhello\n"));
        assert!(prompt.trim_end().ends_with("回答："));
    }

    #[test]
    fn test_service_uses_config() {
        let mut config = Config::default();
        config.project_id = "demo".into();
        config.llm_temperature = 0.7;
        config.llm_timeout_secs = 5;

        let service = LlmService::new(&config, Arc::new(StaticToken::new("k")));
        assert_eq!(service.model_name(), "google/gemini-1.5-flash");
        assert!(service.api_base_url.contains("/projects/demo/"));
        assert_eq!(
            service.options,
            GenerationOptions {
                max_output_tokens: 2048,
                temperature: 0.7,
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[tokio::test]
    async fn test_process_sends_prompt_and_trims_reply() {
        let (config, requests) = llm_server("  Summary: hi \n", Duration::ZERO).await;
        let service = LlmService::new(&config, Arc::new(StaticToken::new("k")));

        let result = service.process("hello").await.unwrap();
        assert_eq!(result, "Summary: hi");

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["auth"], "Bearer k");
        assert_eq!(requests[0]["body"]["model"], "test-model");
        assert_eq!(
            requests[0]["body"]["messages"][0]["content"],
            build_prompt("hello")
        );
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let (config, _) = llm_server("   ", Duration::ZERO).await;
        let service = LlmService::new(&config, Arc::new(StaticToken::new("k")));

        let err = service.process("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::EmptyContent { ref model } if model == "test-model"
        ));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let (config, _) = llm_server("late", Duration::from_secs(3)).await;
        let service = LlmService::new(&config, Arc::new(StaticToken::new("k")));

        let err = service.process("hello").await.unwrap_err();
        assert!(matches!(err, ProcessingError::Timeout { secs: 1, .. }));
    }

    #[tokio::test]
    async fn test_client_reused_until_token_changes() {
        let (config, requests) = llm_server("ok", Duration::ZERO).await;
        let service = LlmService::new(&config, Arc::new(StaticToken::new("k")));

        service.process("a").await.unwrap();
        let first = service.client.lock().unwrap().as_ref().map(|(t, _)| t.clone());
        service.process("b").await.unwrap();
        let second = service.client.lock().unwrap().as_ref().map(|(t, _)| t.clone());
        assert_eq!(first.as_deref(), Some("k"));
        assert_eq!(first, second);

        let rotating = LlmService::new(&config, Arc::new(RotatingToken(AtomicUsize::new(0))));
        rotating.process("c").await.unwrap();
        rotating.process("d").await.unwrap();

        let auths: Vec<Value> = requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r["auth"].clone())
            .collect();
        assert_eq!(auths, vec!["Bearer k", "Bearer k", "Bearer k-1", "Bearer k-2"]);
    }

    /// 测试真实 LLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_BASE_URL=... LLM_API_KEY=... cargo test test_process_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_process_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut config = Config::default();
        config.llm_api_base_url = std::env::var("LLM_API_BASE_URL").ok();
        if let Ok(model) = std::env::var("VERTEX_AI_MODEL") {
            config.llm_model_name = model;
        }
        let key = std::env::var("LLM_API_KEY").unwrap_or_default();

        let service = LlmService::new(&config, Arc::new(StaticToken::new(key)));
        let result = service
            .process("Rust 是一门注重安全和性能的系统编程语言。")
            .await;

        match result {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(!response.is_empty());
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
