//! dappfolio - 模拟区块链体验的终端作品集
//!
//! 模块划分：
//! - **assistant**: 只读取已铸造区块的作品集问答助手
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 会话状态、Reducer、Store、钱包工具与后台编排
//! - **flows**: 铸造对话框、水龙头、助手面板、新手引导、完成证书
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: 日志初始化
//! - **oracle**: 铸造成本估算与 Gas 预言机
//! - **portfolio**: 作品集区块数据
//! - **storage**: 键值存储与持久化快照
//! - **ui**: Ratatui TUI 界面

pub mod assistant;
pub mod config;
pub mod core;
pub mod flows;
pub mod llm;
pub mod observability;
pub mod oracle;
pub mod portfolio;
pub mod storage;
pub mod ui;
