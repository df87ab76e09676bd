//! 编排器：后台任务持有 Store，通过 mpsc 消费命令、通过 watch 广播会话状态
//!
//! 负责：加载作品集与存储、按配置选择 LLM 后端、创建定价/助手/Gas 协作方、启动 Gas 刷新任务。
//! Store 只在该任务内被修改，因此无需加锁；UI 通过 StoreHandle 发送命令。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::assistant::PortfolioAssistant;
use crate::config::{load_config, AppConfig};
use crate::core::reducer::StorePolicy;
use crate::core::state::Session;
use crate::core::store::{Command, Store, Transition};
use crate::llm::{Backend, LlmClient, MockLlmClient};
use crate::oracle::{
    spawn_gas_ticker, CostEstimator, GasOracle, HeuristicCostEstimator, LlmCostEstimator,
    LlmGasOracle, LocalGasOracle,
};
use crate::portfolio::Portfolio;
use crate::storage::{FileStorage, StateStorage};

/// 发往 Store 任务的请求；reply 可选，用于需要知道结果的调用方
#[derive(Debug)]
pub struct StoreRequest {
    pub command: Command,
    pub reply: Option<oneshot::Sender<Transition>>,
}

/// Store 任务的发送端句柄（可克隆）
#[derive(Clone, Debug)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreRequest>,
}

impl StoreHandle {
    /// 发送命令，不等待结果；任务已退出时返回 false
    pub fn send(&self, command: Command) -> bool {
        self.tx
            .send(StoreRequest {
                command,
                reply: None,
            })
            .is_ok()
    }

    /// 发送命令并等待 Transition；任务已退出时返回 None
    pub async fn request(&self, command: Command) -> Option<Transition> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreRequest {
                command,
                reply: Some(reply_tx),
            })
            .ok()?;
        reply_rx.await.ok()
    }
}

/// 运行中的 Store 任务
pub struct StoreRuntime {
    pub handle: StoreHandle,
    pub state_rx: watch::Receiver<Session>,
    shutdown: CancellationToken,
    task: JoinHandle<Store>,
}

impl StoreRuntime {
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 停止任务并取回 Store（已排队的命令会先处理完）
    pub async fn shutdown(self) -> Option<Store> {
        self.shutdown.cancel();
        self.task.await.ok()
    }
}

/// 在后台任务中运行已 Hydrate 的 Store
pub fn spawn_store(mut store: Store) -> StoreRuntime {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreRequest>();
    let state_rx = store.subscribe();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                Some(req) = rx.recv() => {
                    let transition = store.dispatch(req.command);
                    if let Some(reply) = req.reply {
                        let _ = reply.send(transition);
                    }
                }
                _ = token.cancelled() => {
                    while let Ok(req) = rx.try_recv() {
                        let transition = store.dispatch(req.command);
                        if let Some(reply) = req.reply {
                            let _ = reply.send(transition);
                        }
                    }
                    break;
                }
                else => break,
            }
        }
        tracing::info!("Store task stopped");
        store
    });

    StoreRuntime {
        handle: StoreHandle { tx },
        state_rx,
        shutdown,
        task,
    }
}

/// 根据配置与环境变量选择 LLM 后端；均无 Key 时返回 None
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    let backend = Backend::select(&cfg.llm, |key| std::env::var(key).ok())?;
    match &backend {
        Backend::DeepSeek { model, .. } => tracing::info!("Using DeepSeek LLM ({})", model),
        Backend::OpenAi { model, .. } => tracing::info!("Using OpenAI-compatible LLM ({})", model),
    }
    Some(backend.into_client())
}

/// 应用运行时：Store 任务 + 协作方 + 后台 Gas 刷新
pub struct AppRuntime {
    pub config: AppConfig,
    pub portfolio: Arc<Portfolio>,
    pub store: StoreRuntime,
    pub estimator: Arc<dyn CostEstimator>,
    pub assistant: Arc<PortfolioAssistant>,
    gas_task: JoinHandle<()>,
}

impl AppRuntime {
    /// 停止 Gas 刷新与 Store 任务
    pub async fn shutdown(self) {
        let token = self.store.shutdown_token();
        token.cancel();
        let _ = self.gas_task.await;
        self.store.shutdown().await;
        let (prompt, completion, total) = self.assistant.token_usage();
        tracing::info!(prompt, completion, total, "Assistant token usage");
    }
}

/// 创建应用运行时：加载配置、作品集、存储，启动 Store 与 Gas 刷新任务
pub async fn create_runtime(config_path: Option<PathBuf>) -> anyhow::Result<AppRuntime> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let portfolio = match &cfg.app.portfolio_path {
        Some(path) => Portfolio::load(path).or_else(|e| {
            tracing::warn!("Portfolio {} unreadable ({}), using built-in data", path.display(), e);
            Portfolio::builtin()
        })?,
        None => Portfolio::builtin()?,
    };
    let portfolio = Arc::new(portfolio);

    let storage: Arc<dyn StateStorage> = Arc::new(FileStorage::new(&cfg.app.storage_path));
    tracing::info!("Session storage at {}", cfg.app.storage_path.display());
    let store = Store::open(
        storage,
        cfg.app.storage_key.clone(),
        StorePolicy {
            mint_reward: cfg.wallet.mint_reward,
        },
    );
    let store = spawn_store(store);

    let timeout = Duration::from_secs(cfg.llm.timeouts.request);
    let llm = create_llm_from_config(&cfg);

    let estimator: Arc<dyn CostEstimator> = match (&llm, cfg.pricing.source.as_str()) {
        (Some(llm), "llm" | "auto") => Arc::new(LlmCostEstimator::new(llm.clone(), timeout)),
        (None, "llm") => {
            tracing::warn!("pricing.source = llm but no API key set, using heuristic pricing");
            Arc::new(HeuristicCostEstimator)
        }
        _ => Arc::new(HeuristicCostEstimator),
    };

    let gas: Arc<dyn GasOracle> = match (&llm, cfg.gas.source.as_str()) {
        (Some(llm), "llm") => Arc::new(LlmGasOracle::new(llm.clone(), timeout)),
        _ => Arc::new(LocalGasOracle::default()),
    };

    let chat_llm: Arc<dyn LlmClient> = llm.unwrap_or_else(|| {
        tracing::warn!("No API key set or provider unknown, using Mock LLM for the assistant");
        Arc::new(MockLlmClient::new())
    });
    let assistant = Arc::new(PortfolioAssistant::new(
        chat_llm,
        portfolio.clone(),
        timeout,
        cfg.assistant.max_history_turns,
    ));

    let gas_task = spawn_gas_ticker(
        gas,
        Duration::from_secs(cfg.gas.refresh_secs.max(1)),
        store.handle.clone(),
        store.shutdown_token(),
    );

    Ok(AppRuntime {
        config: cfg,
        portfolio,
        store,
        estimator,
        assistant,
        gas_task,
    })
}
