//! 错误类型：Store 拒绝原因与外部协作方（LLM / Gas 预言机）错误
//!
//! Store 自身的操作不会失败，只会以 Rejection 的形式「原样返回」；
//! 协作方错误交给 flows 层转换为用户可见、非致命的提示。

use std::time::Duration;

use thiserror::Error;

use crate::portfolio::BlockId;

/// Store 拒绝执行命令的原因（状态保持不变）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("Store not initialized")]
    NotInitialized,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Block already minted: {0}")]
    AlreadyMinted(BlockId),

    #[error("Insufficient balance: {balance} pETH < {cost} pETH")]
    InsufficientBalance { balance: f64, cost: f64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

/// 协作方调用错误（超时、LLM 失败、返回结构不符）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
