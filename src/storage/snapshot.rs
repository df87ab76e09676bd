//! 会话快照：持久化子集 {isAuthenticated, walletAddress, walletBalance, mintedBlocks, hasCompletedOnboarding}
//!
//! 写出时严格按该结构序列化；读入时逐字段校验并补默认值：未知键忽略、缺失或类型不符的键
//! 视为缺省、未知区块与重复区块丢弃，旧版本或被手改的快照也能加载。

use serde::Serialize;
use serde_json::Value;

use crate::core::state::{Session, SessionPatch};
use crate::portfolio::BlockId;

/// 写入存储的快照（gasPrice、初始化标志与瞬态 UI 标志均不在其中）
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub is_authenticated: bool,
    pub wallet_address: String,
    pub wallet_balance: f64,
    pub minted_blocks: Vec<BlockId>,
    pub has_completed_onboarding: bool,
}

impl From<&Session> for PersistedSnapshot {
    fn from(s: &Session) -> Self {
        Self {
            is_authenticated: s.is_authenticated,
            wallet_address: s.wallet_address.clone(),
            wallet_balance: s.wallet_balance,
            minted_blocks: s.minted_blocks.clone(),
            has_completed_onboarding: s.has_completed_onboarding,
        }
    }
}

impl PersistedSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 宽松解析：只有整体不是合法 JSON 时才报错；非对象的 JSON 视为空补丁
    pub fn parse_patch(raw: &str) -> Result<SessionPatch, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        let Some(obj) = value.as_object() else {
            tracing::warn!("Persisted snapshot is not an object, ignoring");
            return Ok(SessionPatch::default());
        };

        let minted_blocks = obj.get("mintedBlocks").and_then(Value::as_array).map(|items| {
            let mut blocks: Vec<BlockId> = Vec::new();
            for item in items {
                match item.as_str().map(str::parse::<BlockId>) {
                    Some(Ok(id)) if !blocks.contains(&id) => blocks.push(id),
                    Some(Ok(_)) => {}
                    _ => tracing::debug!("Dropping unknown minted block entry: {}", item),
                }
            }
            blocks
        });

        Ok(SessionPatch {
            is_authenticated: obj.get("isAuthenticated").and_then(Value::as_bool),
            wallet_address: obj
                .get("walletAddress")
                .and_then(Value::as_str)
                .map(str::to_string),
            wallet_balance: obj
                .get("walletBalance")
                .and_then(Value::as_f64)
                .filter(|b| b.is_finite()),
            minted_blocks,
            has_completed_onboarding: obj.get("hasCompletedOnboarding").and_then(Value::as_bool),
        })
    }
}
