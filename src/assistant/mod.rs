//! 作品集问答助手
//!
//! 系统提示词只携带已铸造区块的内容；未铸造区块对助手不可见。
//! 历史对话截断为最近 max_history_turns 轮，模型输出必须为 {"answer": string}。

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::CollaboratorError;
use crate::llm::{complete_with_timeout, extract_json, schema_hint, LlmClient, Message};
use crate::portfolio::{BlockId, Portfolio};

#[derive(Debug, Deserialize, JsonSchema)]
struct AnswerOutput {
    /// The answer to the user's question
    answer: String,
}

const ASSISTANT_PROMPT: &str = "You are a helpful AI assistant for a decentralized portfolio application.
You answer questions about the portfolio owner using only the unlocked (minted) content below.
If the answer is not in the unlocked content, say that the information may be in a block that has not been minted yet.

Unlocked portfolio content:
{context}

Respond with a single JSON object matching this schema and nothing else:
{schema}";

pub struct PortfolioAssistant {
    llm: Arc<dyn LlmClient>,
    portfolio: Arc<Portfolio>,
    timeout: Duration,
    max_history_turns: usize,
}

impl PortfolioAssistant {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        portfolio: Arc<Portfolio>,
        timeout: Duration,
        max_history_turns: usize,
    ) -> Self {
        Self {
            llm,
            portfolio,
            timeout,
            max_history_turns,
        }
    }

    /// 助手后端的累计 token 用量 (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 组装请求消息：system（上下文 + schema）、截断后的历史、当前问题
    pub fn build_messages(&self, question: &str, history: &[Message], minted: &[BlockId]) -> Vec<Message> {
        let context = serde_json::to_string_pretty(&self.portfolio.minted_context(minted))
            .unwrap_or_else(|_| "{}".to_string());
        let system = ASSISTANT_PROMPT
            .replace("{context}", &context)
            .replace("{schema}", &schema_hint::<AnswerOutput>());

        let keep = self.max_history_turns.saturating_mul(2);
        let start = history.len().saturating_sub(keep);

        let mut messages = Vec::with_capacity(history.len() - start + 2);
        messages.push(Message::system(system));
        messages.extend(history[start..].iter().cloned());
        messages.push(Message::user(question));
        messages
    }

    /// 回答问题；返回可能为空字符串，由调用方决定如何提示
    pub async fn answer(
        &self,
        question: &str,
        history: &[Message],
        minted: &[BlockId],
    ) -> Result<String, CollaboratorError> {
        let messages = self.build_messages(question, history, minted);
        let raw = complete_with_timeout(self.llm.as_ref(), &messages, self.timeout).await?;
        let output: AnswerOutput = extract_json(&raw)?;
        tracing::debug!(minted = minted.len(), "assistant answered");
        Ok(output.answer.trim().to_string())
    }
}
