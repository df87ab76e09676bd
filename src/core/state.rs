//! 会话状态：Session（完整状态）、SessionPatch（部分快照）、阶段投影
//!
//! Session 是唯一的真相来源；UI 只通过 watch 通道拿到它的克隆，不直接修改。

use crate::portfolio::BlockId;

/// 会话级瞬态 UI 标志，永不持久化
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransientFlags {
    pub assistant_open: bool,
    pub minting_in_progress: bool,
}

/// 单个存储 profile 的会话状态
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// 首次 Hydrate 之前为 false
    pub is_initialized: bool,
    pub is_authenticated: bool,
    pub wallet_address: String,
    pub wallet_balance: f64,
    /// 按铸造顺序排列，无重复
    pub minted_blocks: Vec<BlockId>,
    /// 瞬态，不持久化
    pub gas_price: f64,
    pub has_completed_onboarding: bool,
    pub flags: TransientFlags,
}

/// 会话阶段（状态机投影）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Disconnected,
    Connected,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        if !self.is_initialized {
            SessionPhase::Uninitialized
        } else if self.is_authenticated {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        }
    }

    pub fn is_minted(&self, id: BlockId) -> bool {
        self.minted_blocks.contains(&id)
    }
}

/// 部分快照：每个字段可选，Hydrate 时只合并 Some 的字段
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionPatch {
    pub is_authenticated: Option<bool>,
    pub wallet_address: Option<String>,
    pub wallet_balance: Option<f64>,
    pub minted_blocks: Option<Vec<BlockId>>,
    pub has_completed_onboarding: Option<bool>,
}

