//! 内容区块：区块标识与各类区块内容
//!
//! BlockId 是固定枚举（about / projects / skills / contact / certifications / education），
//! 序列化为小写字符串，与持久化快照中的 mintedBlocks 一致。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 区块标识（固定集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockId {
    About,
    Projects,
    Skills,
    Contact,
    Certifications,
    Education,
}

impl BlockId {
    pub const ALL: [BlockId; 6] = [
        BlockId::About,
        BlockId::Projects,
        BlockId::Skills,
        BlockId::Contact,
        BlockId::Certifications,
        BlockId::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockId::About => "about",
            BlockId::Projects => "projects",
            BlockId::Skills => "skills",
            BlockId::Contact => "contact",
            BlockId::Certifications => "certifications",
            BlockId::Education => "education",
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown block id: {0}")]
pub struct UnknownBlockId(pub String);

impl FromStr for BlockId {
    type Err = UnknownBlockId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| UnknownBlockId(s.to_string()))
    }
}

/// 单个作品集区块：标题、内容，以及供定价使用的复杂度/互动度描述
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioBlock {
    pub id: BlockId,
    pub title: String,
    pub content: BlockContent,
    /// 内容复杂度描述（定价输入）
    pub complexity: String,
    /// 用户互动潜力描述（定价输入）
    pub engagement: String,
}

/// 区块内容；除 description 外各段按区块类型可选
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockContent {
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<SkillGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<ContactMethod>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<Certification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<Education>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillGroup {
    pub category: String,
    pub list: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMethod {
    pub method: String,
    pub value: String,
    pub href: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub title: String,
    pub issuer: String,
    pub date: String,
    pub credential_url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub gpa: String,
    pub coursework: Vec<String>,
}

impl PortfolioBlock {
    /// 渲染为纯文本行（TUI 内容查看器使用）
    pub fn text_lines(&self) -> Vec<String> {
        let c = &self.content;
        let mut lines = vec![c.description.clone()];
        for p in &c.projects {
            lines.push(String::new());
            lines.push(format!("▸ {}", p.title));
            lines.push(p.description.clone());
            if !p.tech_stack.is_empty() {
                lines.push(format!("  Stack: {}", p.tech_stack.join(", ")));
            }
            if let Some(url) = &p.live_url {
                lines.push(format!("  Live: {url}"));
            }
            if let Some(url) = &p.repo_url {
                lines.push(format!("  Repo: {url}"));
            }
        }
        for g in &c.skills {
            lines.push(format!("▸ {}: {}", g.category, g.list.join(", ")));
        }
        for m in &c.contact {
            lines.push(format!("▸ {}: {}", m.method, m.value));
        }
        for cert in &c.certifications {
            lines.push(format!("▸ {} ({}, {})", cert.title, cert.issuer, cert.date));
            lines.push(format!("  {}", cert.credential_url));
        }
        for e in &c.education {
            lines.push(format!("▸ {}, {} (GPA {})", e.degree, e.institution, e.gpa));
            if !e.coursework.is_empty() {
                lines.push(format!("  Coursework: {}", e.coursework.join(", ")));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_parse() {
        assert_eq!("about".parse::<BlockId>().unwrap(), BlockId::About);
        assert_eq!(" skills ".parse::<BlockId>().unwrap(), BlockId::Skills);
        assert!("wallet".parse::<BlockId>().is_err());
    }

    #[test]
    fn test_block_id_serde_lowercase() {
        let json = serde_json::to_string(&BlockId::Certifications).unwrap();
        assert_eq!(json, "\"certifications\"");
        let back: BlockId = serde_json::from_str("\"education\"").unwrap();
        assert_eq!(back, BlockId::Education);
    }
}
