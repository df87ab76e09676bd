//! 作品集内容：区块模型、内置数据与「仅已铸造区块」的上下文提取
//!
//! 内置数据来自 assets/portfolio.json；可通过配置 app.portfolio_path 指定外部 JSON 覆盖。

pub mod block;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use block::{BlockContent, BlockId, PortfolioBlock, UnknownBlockId};

const BUILTIN_PORTFOLIO: &str = include_str!("../../assets/portfolio.json");

/// 作品集所有者（落地页与奖励证书展示）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
}

/// 完整作品集：所有者 + 按展示顺序排列的区块
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Portfolio {
    pub owner: Owner,
    pub blocks: Vec<PortfolioBlock>,
}

impl Portfolio {
    /// 解析内置作品集数据
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_PORTFOLIO)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut portfolio: Portfolio = serde_json::from_str(raw)?;
        // 同一区块只保留首次出现
        let mut seen = Vec::new();
        portfolio.blocks.retain(|b| {
            if seen.contains(&b.id) {
                false
            } else {
                seen.push(b.id);
                true
            }
        });
        Ok(portfolio)
    }

    /// 从外部文件加载；失败时由调用方决定是否回退内置数据
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: BlockId) -> Option<&PortfolioBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    /// 是否所有区块都已铸造
    pub fn is_complete(&self, minted: &[BlockId]) -> bool {
        !self.blocks.is_empty() && self.blocks.iter().all(|b| minted.contains(&b.id))
    }

    /// 助手可见的上下文：仅包含 minted 中的区块（标题 + 内容），未铸造内容绝不进入
    pub fn minted_context(&self, minted: &[BlockId]) -> serde_json::Value {
        let mut blocks = serde_json::Map::new();
        for id in minted {
            if let Some(block) = self.get(*id) {
                blocks.insert(
                    id.as_str().to_string(),
                    serde_json::json!({
                        "title": block.title,
                        "content": block.content,
                    }),
                );
            }
        }
        serde_json::json!({
            "owner": self.owner.name,
            "blocks": blocks,
        })
    }
}
