//! 铸造对话框状态机
//!
//! Idle -> Calculating -> Confirm(quote) -> Mining{progress} -> Done，任一步可进入 Error。
//! 每次 open 递增 generation；估算结果携带的票据过期即丢弃，避免旧请求覆盖新对话框。

use thiserror::Error;

use crate::core::{CollaboratorError, Session};
use crate::portfolio::BlockId;

pub const ESTIMATE_FAILED_MESSAGE: &str = "Could not determine minting cost. Please try again later.";
pub const INSUFFICIENT_BALANCE_MESSAGE: &str = "Insufficient pETH balance to mint this block.";

/// 每个 advance 步进的进度
pub const MINING_STEP: u8 = 5;

/// 报价：缩放后的基础成本 + 当前 Gas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MintQuote {
    pub base_cost: f64,
    pub gas_fee: f64,
    pub total: f64,
}

impl MintQuote {
    pub fn new(raw_cost: f64, cost_scale: f64, gas_fee: f64) -> Self {
        let base_cost = raw_cost * cost_scale;
        Self {
            base_cost,
            gas_fee,
            total: base_cost + gas_fee,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MintPhase {
    Idle,
    Calculating,
    Confirm(MintQuote),
    Mining { progress: u8 },
    Done,
    Error(String),
}

/// 估算请求的票据：区块 + 发起时的 generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintTicket {
    pub block: BlockId,
    pub generation: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MintError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Block already minted: {0}")]
    AlreadyMinted(BlockId),

    #[error("Insufficient balance: {balance} pETH < {total} pETH")]
    InsufficientBalance { balance: f64, total: f64 },

    #[error("No quote to confirm")]
    NoQuote,
}

impl MintError {
    /// 对话框中展示的文案
    pub fn user_message(&self) -> String {
        match self {
            MintError::InsufficientBalance { .. } => INSUFFICIENT_BALANCE_MESSAGE.to_string(),
            MintError::AlreadyMinted(id) => format!("Block '{id}' has already been mined."),
            MintError::NotConnected => "Connect your wallet to mine blocks.".to_string(),
            MintError::NoQuote => ESTIMATE_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct MintFlow {
    block: Option<BlockId>,
    phase: MintPhase,
    generation: u64,
    cost_scale: f64,
    raw_cost: Option<f64>,
    /// 确认时锁定的总价（挖矿期间 Gas 变化不再影响）
    locked_total: Option<f64>,
}

impl MintFlow {
    pub fn new(cost_scale: f64) -> Self {
        Self {
            block: None,
            phase: MintPhase::Idle,
            generation: 0,
            cost_scale,
            raw_cost: None,
            locked_total: None,
        }
    }

    pub fn phase(&self) -> &MintPhase {
        &self.phase
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    pub fn is_open(&self) -> bool {
        self.block.is_some()
    }

    /// 打开对话框并进入 Calculating；返回的票据用于匹配估算结果
    pub fn open(&mut self, block: BlockId) -> MintTicket {
        self.generation += 1;
        self.block = Some(block);
        self.raw_cost = None;
        self.locked_total = None;
        self.phase = MintPhase::Calculating;
        MintTicket {
            block,
            generation: self.generation,
        }
    }

    /// 关闭对话框；进行中的估算随之作废
    pub fn dismiss(&mut self) {
        self.generation += 1;
        self.block = None;
        self.raw_cost = None;
        self.locked_total = None;
        self.phase = MintPhase::Idle;
    }

    fn is_current(&self, ticket: &MintTicket) -> bool {
        ticket.generation == self.generation && self.block == Some(ticket.block)
    }

    /// 应用估算结果；票据过期或不在 Calculating 时返回 false
    pub fn apply_estimate(
        &mut self,
        ticket: MintTicket,
        result: Result<f64, CollaboratorError>,
        gas_price: f64,
    ) -> bool {
        if !self.is_current(&ticket) || self.phase != MintPhase::Calculating {
            tracing::debug!(block = %ticket.block, "stale mint estimate dropped");
            return false;
        }
        match result {
            Ok(raw) => {
                self.raw_cost = Some(raw);
                self.phase = MintPhase::Confirm(MintQuote::new(raw, self.cost_scale, gas_price));
            }
            Err(e) => {
                tracing::warn!(block = %ticket.block, "Mint cost estimate failed: {}", e);
                self.phase = MintPhase::Error(ESTIMATE_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    /// Gas 变化时更新确认中的报价
    pub fn reprice(&mut self, gas_price: f64) {
        if let (MintPhase::Confirm(_), Some(raw)) = (&self.phase, self.raw_cost) {
            self.phase = MintPhase::Confirm(MintQuote::new(raw, self.cost_scale, gas_price));
        }
    }

    /// 确认铸造：预检连接、重复铸造与余额，通过后进入 Mining
    pub fn confirm(&mut self, session: &Session) -> Result<(), MintError> {
        let (block, quote) = match (self.block, &self.phase) {
            (Some(block), MintPhase::Confirm(quote)) => (block, *quote),
            _ => return Err(MintError::NoQuote),
        };
        let checked = if !session.is_authenticated {
            Err(MintError::NotConnected)
        } else if session.is_minted(block) {
            Err(MintError::AlreadyMinted(block))
        } else if quote.total > session.wallet_balance {
            Err(MintError::InsufficientBalance {
                balance: session.wallet_balance,
                total: quote.total,
            })
        } else {
            Ok(())
        };
        match &checked {
            Ok(()) => {
                self.locked_total = Some(quote.total);
                self.phase = MintPhase::Mining { progress: 0 };
            }
            Err(e) => self.phase = MintPhase::Error(e.user_message()),
        }
        checked
    }

    /// 推进挖矿进度；到达 100 时进入 Done 并返回要提交的 (区块, 总价)
    pub fn advance(&mut self) -> Option<(BlockId, f64)> {
        let MintPhase::Mining { progress } = self.phase else {
            return None;
        };
        let next = progress.saturating_add(MINING_STEP).min(100);
        if next < 100 {
            self.phase = MintPhase::Mining { progress: next };
            return None;
        }
        self.phase = MintPhase::Done;
        self.block.zip(self.locked_total)
    }

    /// Store 拒绝提交时显示错误
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = MintPhase::Error(message.into());
    }
}
