//! 表现层本地流程：铸造对话框、水龙头冷却、助手面板、新手引导、完成证书
//!
//! 这些状态只属于 UI，不进入 Store；每个流程把结果翻译为 Command 或用户可见的提示。

pub mod chat;
pub mod faucet;
pub mod mint;
pub mod onboarding;
pub mod reward;

pub use chat::{ChatPanel, ChatTicket};
pub use faucet::{Faucet, FaucetError};
pub use mint::{MintError, MintFlow, MintPhase, MintQuote, MintTicket};
pub use onboarding::{OnboardingGuide, OnboardingStep, ONBOARDING_STEPS};
pub use reward::Certificate;
