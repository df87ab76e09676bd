//! 铸造成本估算
//!
//! LlmCostEstimator 把区块名称、复杂度与互动潜力交给文本补全服务，要求返回 {"mintCost": number}；
//! HeuristicCostEstimator 按描述长度计算，离线可用。返回值是未缩放的原始成本。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::CollaboratorError;
use crate::llm::{complete_with_timeout, extract_json, schema_hint, LlmClient, Message};
use crate::portfolio::PortfolioBlock;

/// 估算请求：区块名称 + 两段描述
#[derive(Debug, Clone, PartialEq)]
pub struct MintCostRequest {
    pub block_label: String,
    pub complexity: String,
    pub engagement: String,
}

impl From<&PortfolioBlock> for MintCostRequest {
    fn from(block: &PortfolioBlock) -> Self {
        Self {
            block_label: block.title.clone(),
            complexity: block.complexity.clone(),
            engagement: block.engagement.clone(),
        }
    }
}

/// 期望的模型输出结构
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintCostOutput {
    /// The cost in pETH to mint the block
    pub mint_cost: f64,
}

#[async_trait]
pub trait CostEstimator: Send + Sync {
    async fn estimate(&self, request: &MintCostRequest) -> Result<f64, CollaboratorError>;
}

/// 本地启发式：复杂度描述长度 × 0.1 + 互动描述长度 × 0.05 + 1.0
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicCostEstimator;

impl HeuristicCostEstimator {
    pub fn cost(request: &MintCostRequest) -> f64 {
        request.complexity.chars().count() as f64 * 0.1
            + request.engagement.chars().count() as f64 * 0.05
            + 1.0
    }
}

#[async_trait]
impl CostEstimator for HeuristicCostEstimator {
    async fn estimate(&self, request: &MintCostRequest) -> Result<f64, CollaboratorError> {
        Ok(Self::cost(request))
    }
}

const PRICING_PROMPT: &str = "You are an expert in determining the minting cost for portfolio blocks in a decentralized application.
Based on the block's content complexity and its potential for user engagement, determine an appropriate minting cost in pETH.
A reasonable cost is the complexity description length times 0.1, plus the engagement description length times 0.05, plus 1.0.
Respond with a single JSON object matching this schema and nothing else:
{schema}";

/// 基于 LLM 的估算器；超时与结构不符都作为可区分的错误返回
pub struct LlmCostEstimator {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl LlmCostEstimator {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    fn build_messages(request: &MintCostRequest) -> Vec<Message> {
        let system = PRICING_PROMPT.replace("{schema}", &schema_hint::<MintCostOutput>());
        let user = format!(
            "The block type is: {}\nThe content complexity is described as: {}\nThe user engagement potential is described as: {}",
            request.block_label, request.complexity, request.engagement
        );
        vec![Message::system(system), Message::user(user)]
    }
}

#[async_trait]
impl CostEstimator for LlmCostEstimator {
    async fn estimate(&self, request: &MintCostRequest) -> Result<f64, CollaboratorError> {
        let messages = Self::build_messages(request);
        let raw = complete_with_timeout(self.llm.as_ref(), &messages, self.timeout).await?;
        let output: MintCostOutput = extract_json(&raw)?;
        if !output.mint_cost.is_finite() || output.mint_cost < 0.0 {
            return Err(CollaboratorError::MalformedResponse(format!(
                "mintCost out of range: {}",
                output.mint_cost
            )));
        }
        tracing::debug!(block = %request.block_label, cost = output.mint_cost, "mint cost estimated");
        Ok(output.mint_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};

    fn request() -> MintCostRequest {
        MintCostRequest {
            block_label: "About Me".into(),
            complexity: "0123456789".into(),
            engagement: "01234567890123456789".into(),
        }
    }

    #[tokio::test]
    async fn test_heuristic_cost() {
        let cost = HeuristicCostEstimator.estimate(&request()).await.unwrap();
        assert!((cost - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_llm_cost_parsed() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Ok("```json\n{\"mintCost\": 4.2}\n```".into())]));
        let est = LlmCostEstimator::new(llm.clone(), Duration::from_secs(1));
        assert_eq!(est.estimate(&request()).await.unwrap(), 4.2);

        let sent = &llm.received()[0];
        assert!(sent[0].content.contains("mintCost"));
        assert!(sent[1].content.contains("About Me"));
    }

    #[tokio::test]
    async fn test_llm_cost_malformed_or_negative() {
        let llm = Arc::new(MockLlmClient::scripted(vec![
            Ok("{\"answer\": \"cheap\"}".into()),
            Ok("{\"mintCost\": -1}".into()),
        ]));
        let est = LlmCostEstimator::new(llm, Duration::from_secs(1));
        assert!(matches!(
            est.estimate(&request()).await,
            Err(CollaboratorError::MalformedResponse(_))
        ));
        assert!(matches!(
            est.estimate(&request()).await,
            Err(CollaboratorError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_llm_cost_backend_error() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Err(LlmError::EmptyResponse)]));
        let est = LlmCostEstimator::new(llm, Duration::from_secs(1));
        assert!(matches!(est.estimate(&request()).await, Err(CollaboratorError::Llm(_))));
    }

    #[tokio::test]
    async fn test_llm_cost_timeout() {
        let llm = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(300)));
        let est = LlmCostEstimator::new(llm, Duration::from_millis(20));
        assert!(matches!(est.estimate(&request()).await, Err(CollaboratorError::Timeout(_))));
    }
}
