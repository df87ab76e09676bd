//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `DAPPFOLIO__*` 覆盖（双下划线表示嵌套，如 `DAPPFOLIO__WALLET__FAUCET_AMOUNT=5`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub wallet: WalletSection,
    pub pricing: PricingSection,
    pub gas: GasSection,
    pub llm: LlmSection,
    pub assistant: AssistantSection,
}

/// [app] 段：存储位置与作品集数据
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 会话存储文件（JSON，键 -> 字符串）
    pub storage_path: PathBuf,
    /// 会话快照所在的键
    pub storage_key: String,
    /// 外部作品集 JSON，未设置时用内置数据
    pub portfolio_path: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "DAppfolio".to_string(),
            storage_path: PathBuf::from(".dappfolio/storage.json"),
            storage_key: "dappfolio-portfolio-state".to_string(),
            portfolio_path: None,
        }
    }
}

/// [wallet] 段：初始余额、水龙头、铸造奖励
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletSection {
    pub initial_balance: f64,
    pub faucet_amount: f64,
    /// 水龙头冷却（秒），由 UI 强制，Store 不限流
    pub faucet_cooldown_secs: u64,
    /// 每次铸造额外返还的 pETH
    pub mint_reward: f64,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            initial_balance: 10.0,
            faucet_amount: 10.0,
            faucet_cooldown_secs: 30,
            mint_reward: 0.0,
        }
    }
}

/// [pricing] 段：铸造成本来源（auto / llm / local）与显示缩放
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingSection {
    pub source: String,
    /// 估算结果乘以该系数作为基础费用
    pub cost_scale: f64,
}

impl Default for PricingSection {
    fn default() -> Self {
        Self {
            source: "auto".to_string(),
            cost_scale: 0.1,
        }
    }
}

/// [gas] 段：Gas 价格来源（local / llm）与刷新间隔
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GasSection {
    pub source: String,
    pub refresh_secs: u64,
}

impl Default for GasSection {
    fn default() -> Self {
        Self {
            source: "local".to_string(),
            refresh_secs: 10,
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai；优先级由 API Key 与 provider 共同决定
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub deepseek: LlmDeepSeekSection,
    pub openai: LlmOpenAiSection,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            deepseek: LlmDeepSeekSection::default(),
            openai: LlmOpenAiSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）；超时后 UI 不会卡在「计算中」
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 8 }
    }
}

/// [assistant] 段：对话历史保留轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantSection {
    pub max_history_turns: usize,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
        }
    }
}

/// 从 config 目录加载配置，环境变量 DAPPFOLIO__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 DAPPFOLIO__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {} not found, ignoring", path.display());
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("DAPPFOLIO")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.wallet.initial_balance, 10.0);
        assert_eq!(cfg.wallet.faucet_cooldown_secs, 30);
        assert_eq!(cfg.pricing.cost_scale, 0.1);
        assert_eq!(cfg.gas.refresh_secs, 10);
        assert_eq!(cfg.llm.timeouts.request, 8);
        assert_eq!(cfg.app.storage_key, "dappfolio-portfolio-state");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[wallet]\nfaucet_amount = 2.5\n\n[gas]\nsource = \"llm\"\n",
        )
        .unwrap();
        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.wallet.faucet_amount, 2.5);
        assert_eq!(cfg.wallet.initial_balance, 10.0);
        assert_eq!(cfg.gas.source, "llm");
        assert_eq!(cfg.gas.refresh_secs, 10);
    }
}
