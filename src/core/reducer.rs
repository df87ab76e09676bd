//! 纯函数 Reducer：(Session, Action) -> Result<Session, Rejection>
//!
//! 所有不变式在这里强制：mintedBlocks 无重复、余额只由水龙头与铸造改变、
//! 未初始化时只接受 Hydrate、钱包命令要求已连接、铸造不允许余额为负。

use crate::core::error::Rejection;
use crate::core::state::{Session, SessionPatch, TransientFlags};
use crate::core::wallet::is_valid_address;
use crate::portfolio::BlockId;

/// Reducer 可处理的动作；Connect 的地址已由 Store 预先生成，保证 reduce 是纯函数
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Hydrate(SessionPatch),
    ConnectWallet { address: String, balance: f64 },
    DisconnectWallet,
    ClaimFaucet { amount: f64 },
    MintBlock { block: BlockId, cost: f64 },
    SetGasPrice(f64),
    CompleteOnboarding,
    SetAssistantOpen(bool),
    SetMinting(bool),
}

/// Store 策略：每次铸造附加的固定奖励（默认 0）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorePolicy {
    pub mint_reward: f64,
}

/// 计算下一个状态；Err 表示拒绝，调用方保持原状态
pub fn reduce(state: &Session, action: &Action, policy: &StorePolicy) -> Result<Session, Rejection> {
    match action {
        Action::Hydrate(patch) => Ok(hydrate(state, patch)),
        _ if !state.is_initialized => Err(Rejection::NotInitialized),
        Action::ConnectWallet { address, balance } => {
            check_amount(*balance)?;
            Ok(Session {
                is_authenticated: true,
                wallet_address: address.clone(),
                wallet_balance: *balance,
                ..state.clone()
            })
        }
        Action::DisconnectWallet => Ok(Session {
            is_initialized: true,
            minted_blocks: state.minted_blocks.clone(),
            has_completed_onboarding: state.has_completed_onboarding,
            gas_price: state.gas_price,
            ..Session::default()
        }),
        Action::ClaimFaucet { amount } => {
            require_connected(state)?;
            check_amount(*amount)?;
            Ok(Session {
                wallet_balance: state.wallet_balance + amount,
                ..state.clone()
            })
        }
        Action::MintBlock { block, cost } => {
            require_connected(state)?;
            check_amount(*cost)?;
            if state.is_minted(*block) {
                return Err(Rejection::AlreadyMinted(*block));
            }
            if *cost > state.wallet_balance {
                return Err(Rejection::InsufficientBalance {
                    balance: state.wallet_balance,
                    cost: *cost,
                });
            }
            let mut next = state.clone();
            next.wallet_balance = state.wallet_balance - cost + policy.mint_reward;
            next.minted_blocks.push(*block);
            next.flags.minting_in_progress = false;
            Ok(next)
        }
        Action::SetGasPrice(value) => {
            if !value.is_finite() {
                return Err(Rejection::InvalidAmount(*value));
            }
            Ok(Session {
                gas_price: *value,
                ..state.clone()
            })
        }
        Action::CompleteOnboarding => {
            require_connected(state)?;
            Ok(Session {
                has_completed_onboarding: true,
                ..state.clone()
            })
        }
        Action::SetAssistantOpen(open) => Ok(Session {
            flags: TransientFlags {
                assistant_open: *open,
                ..state.flags.clone()
            },
            ..state.clone()
        }),
        Action::SetMinting(minting) => Ok(Session {
            flags: TransientFlags {
                minting_in_progress: *minting,
                ..state.flags.clone()
            },
            ..state.clone()
        }),
    }
}

fn require_connected(state: &Session) -> Result<(), Rejection> {
    if state.is_authenticated {
        Ok(())
    } else {
        Err(Rejection::NotConnected)
    }
}

fn check_amount(amount: f64) -> Result<(), Rejection> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Rejection::InvalidAmount(amount))
    }
}

/// 合并补丁并标记已初始化；已认证但地址非法的补丁回退为断开状态
fn hydrate(state: &Session, patch: &SessionPatch) -> Session {
    let mut next = state.clone();
    next.is_initialized = true;
    if let Some(v) = patch.is_authenticated {
        next.is_authenticated = v;
    }
    if let Some(addr) = &patch.wallet_address {
        next.wallet_address = addr.clone();
    }
    if let Some(balance) = patch.wallet_balance {
        next.wallet_balance = if balance.is_finite() { balance.max(0.0) } else { 0.0 };
    }
    if let Some(blocks) = &patch.minted_blocks {
        next.minted_blocks.clear();
        for id in blocks {
            if !next.minted_blocks.contains(id) {
                next.minted_blocks.push(*id);
            }
        }
    }
    if let Some(v) = patch.has_completed_onboarding {
        next.has_completed_onboarding = v;
    }
    if !next.is_authenticated || !is_valid_address(&next.wallet_address) {
        next.is_authenticated = false;
        next.wallet_address.clear();
        next.wallet_balance = 0.0;
    }
    next
}
