//! OpenAI 兼容的 chat completions 后端
//!
//! DeepSeek 与 OpenAI 都走这一实现，只是 base_url / model / key 不同（见 provider.rs）。
//! 定价、Gas、问答都要求模型只回 JSON，因此温度固定为较低值。

use std::sync::atomic::{AtomicU64, Ordering};

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, Role};

const JSON_TEMPERATURE: f32 = 0.2;

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
        }
    }

    fn request_message(m: &Message) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let content = m.content.clone();
        Ok(match m.role {
            Role::System => ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()?,
            ),
            Role::User => ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()?,
            ),
            Role::Assistant => ChatCompletionRequestMessage::Assistant(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()?,
            ),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn token_usage(&self) -> (u64, u64, u64) {
        let prompt = self.prompt_tokens.load(Ordering::Relaxed);
        let completion = self.completion_tokens.load(Ordering::Relaxed);
        (prompt, completion, prompt + completion)
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request_err = |e: OpenAIError| LlmError::Request(e.to_string());

        let messages = messages
            .iter()
            .map(Self::request_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(request_err)?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(JSON_TEMPERATURE)
            .messages(messages)
            .build()
            .map_err(request_err)?;

        let response = self.client.chat().create(request).await.map_err(request_err)?;

        if let Some(usage) = &response.usage {
            self.prompt_tokens
                .fetch_add(u64::from(usage.prompt_tokens), Ordering::Relaxed);
            self.completion_tokens
                .fetch_add(u64::from(usage.completion_tokens), Ordering::Relaxed);
            tracing::debug!(
                model = %self.model,
                prompt = usage.prompt_tokens,
                completion = usage.completion_tokens,
                "chat completion usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
