//! 可观测性：tracing 订阅器初始化
//!
//! TUI 占用终端，因此日志写入 <dir>/dappfolio.log；文件无法打开时退回 stderr。
//! 过滤级别默认 info，可通过 RUST_LOG 覆盖。

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "dappfolio.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(log_dir: &Path) {
    let file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE))
    });

    match file {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init();
        }
        Err(e) => {
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init();
            tracing::warn!("Log file unavailable ({}), logging to stderr", e);
        }
    }
}
