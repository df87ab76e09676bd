//! dappfolio 入口：初始化日志、创建运行时（Store + 协作方 + Gas 刷新），运行 TUI，退出时停止后台任务。
//!
//! 用法：dappfolio [config.toml]

use std::path::{Path, PathBuf};

use anyhow::Context;
use dappfolio::{core::create_runtime, observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init(Path::new(".dappfolio"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let runtime = create_runtime(config_path)
        .await
        .context("Failed to create runtime")?;

    let result = run_app(&runtime).await.context("App run failed");

    runtime.shutdown().await;
    tracing::info!("dappfolio exited");
    result
}
