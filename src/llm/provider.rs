//! 后端选择：按配置与环境变量决定使用 DeepSeek、OpenAI 兼容端点，或不使用 LLM
//!
//! - DEEPSEEK_API_KEY 存在 -> DeepSeek
//! - provider = "deepseek" 且只有 OPENAI_API_KEY -> DeepSeek（沿用该 key）
//! - 否则 OPENAI_API_KEY 存在 -> OpenAI 兼容端点（可配置 base_url）
//! - 都没有 -> None，调用方回退到本地实现

use std::sync::Arc;

use crate::config::LlmSection;
use crate::llm::{LlmClient, OpenAiClient};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    DeepSeek { model: String, api_key: String },
    OpenAi { base_url: Option<String>, model: String, api_key: String },
}

impl Backend {
    /// env 为环境变量查询函数，便于测试注入
    pub fn select(cfg: &LlmSection, env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let deepseek_key = env("DEEPSEEK_API_KEY");
        let openai_key = env("OPENAI_API_KEY");
        let wants_deepseek = cfg.provider.eq_ignore_ascii_case("deepseek");

        let deepseek_model = || {
            env("DEEPSEEK_MODEL")
                .or_else(|| cfg.deepseek.model.clone())
                .unwrap_or_else(|| cfg.model.clone())
        };

        match (deepseek_key, openai_key) {
            (Some(api_key), _) => Some(Backend::DeepSeek {
                model: deepseek_model(),
                api_key,
            }),
            (None, Some(api_key)) if wants_deepseek => Some(Backend::DeepSeek {
                model: deepseek_model(),
                api_key,
            }),
            (None, Some(api_key)) => Some(Backend::OpenAi {
                base_url: cfg.base_url.clone(),
                model: cfg
                    .openai
                    .model
                    .clone()
                    .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
                api_key,
            }),
            (None, None) => None,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Backend::DeepSeek { model, .. } | Backend::OpenAi { model, .. } => model,
        }
    }

    pub fn into_client(self) -> Arc<dyn LlmClient> {
        match self {
            Backend::DeepSeek { model, api_key } => {
                Arc::new(OpenAiClient::new(Some(DEEPSEEK_BASE_URL), &model, &api_key))
            }
            Backend::OpenAi {
                base_url,
                model,
                api_key,
            } => Arc::new(OpenAiClient::new(base_url.as_deref(), &model, &api_key)),
        }
    }
}
