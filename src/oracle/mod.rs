//! 预言机：铸造成本估算与 Gas 价格（均为装饰性数值）
//!
//! 两者都有 LLM 实现与本地实现；LLM 不可用时回退本地实现，调用方只依赖 trait。

pub mod gas;
pub mod mint_cost;

pub use gas::{spawn_gas_ticker, GasOracle, LlmGasOracle, LocalGasOracle};
pub use mint_cost::{
    CostEstimator, HeuristicCostEstimator, LlmCostEstimator, MintCostOutput, MintCostRequest,
};
