//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete；
//! complete_with_timeout 为每次调用加客户端超时，并把错误统一映射为 CollaboratorError。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;

use crate::core::CollaboratorError;
use crate::llm::Message;

/// 后端调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Empty response")]
    EmptyResponse,
}

impl From<LlmError> for CollaboratorError {
    fn from(e: LlmError) -> Self {
        CollaboratorError::Llm(e.to_string())
    }
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 在 limit 内完成一次调用；超时返回 CollaboratorError::Timeout
pub async fn complete_with_timeout(
    llm: &dyn LlmClient,
    messages: &[Message],
    limit: Duration,
) -> Result<String, CollaboratorError> {
    match timeout(limit, llm.complete(messages)).await {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(e)) => {
            tracing::warn!("LLM call failed: {}", e);
            Err(e.into())
        }
        Err(_) => {
            tracing::warn!("LLM call timed out after {:?}", limit);
            Err(CollaboratorError::Timeout(limit))
        }
    }
}
