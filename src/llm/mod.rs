//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）、后端选择、超时包装与结构化输出解析

pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod structured;
pub mod traits;

pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use provider::Backend;
pub use structured::{extract_json, schema_hint};
pub use traits::{complete_with_timeout, LlmClient, LlmError};
