//! Gas 预言机与周期刷新任务
//!
//! 本地实现在 [1e-7, 9e-7) pETH 内均匀取值；LLM 实现要求返回 {"gasPrice": number}。
//! 刷新任务每隔 interval 取一次值并通过 StoreHandle 下发 SetGasPrice，失败时保留旧值。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{Command, CollaboratorError, StoreHandle};
use crate::llm::{complete_with_timeout, extract_json, schema_hint, LlmClient, Message};

pub const MIN_GAS_PRICE: f64 = 0.000_000_1;
pub const MAX_GAS_PRICE: f64 = 0.000_000_9;

#[async_trait]
pub trait GasOracle: Send + Sync {
    async fn sample(&self) -> Result<f64, CollaboratorError>;
}

/// 本地伪随机 Gas（避免调用外部服务的频率限制）
#[derive(Debug, Clone)]
pub struct LocalGasOracle {
    min: f64,
    max: f64,
}

impl Default for LocalGasOracle {
    fn default() -> Self {
        Self {
            min: MIN_GAS_PRICE,
            max: MAX_GAS_PRICE,
        }
    }
}

#[async_trait]
impl GasOracle for LocalGasOracle {
    async fn sample(&self) -> Result<f64, CollaboratorError> {
        Ok(rand::thread_rng().gen_range(self.min..self.max))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GasPriceOutput {
    /// The simulated gas price in pETH
    gas_price: f64,
}

/// 由文本补全服务给出的 Gas 价格
pub struct LlmGasOracle {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl LlmGasOracle {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl GasOracle for LlmGasOracle {
    async fn sample(&self) -> Result<f64, CollaboratorError> {
        let messages = vec![
            Message::system(format!(
                "You simulate a gas oracle for a demo blockchain. Respond with a single JSON object matching this schema and nothing else:\n{}",
                schema_hint::<GasPriceOutput>()
            )),
            Message::user(format!(
                "Give a realistic fluctuating gas price in pETH between {MIN_GAS_PRICE} and {MAX_GAS_PRICE}."
            )),
        ];
        let raw = complete_with_timeout(self.llm.as_ref(), &messages, self.timeout).await?;
        let output: GasPriceOutput = extract_json(&raw)?;
        if output.gas_price.is_finite() && output.gas_price >= 0.0 {
            Ok(output.gas_price)
        } else {
            Err(CollaboratorError::MalformedResponse(format!(
                "gasPrice out of range: {}",
                output.gas_price
            )))
        }
    }
}

/// 启动 Gas 刷新任务：立即取一次，之后每 interval 一次，cancel 后退出
pub fn spawn_gas_ticker(
    oracle: Arc<dyn GasOracle>,
    interval: Duration,
    store: StoreHandle,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match oracle.sample().await {
                        Ok(price) => {
                            if !store.send(Command::SetGasPrice(price)) {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Failed to fetch gas price: {}", e),
                    }
                }
            }
        }
        tracing::debug!("Gas ticker stopped");
    })
}
