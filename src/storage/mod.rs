//! 持久化层：键值字符串存储抽象与实现，以及会话快照编解码
//!
//! 存储只被 Store 访问：启动时读一次，每次持久化字段变更后写一次；读写失败均不致命。

pub mod file;
pub mod memory;
pub mod snapshot;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use snapshot::PersistedSnapshot;

/// 存储读写错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// 键值字符串存储（对应浏览器 localStorage 的语义）
pub trait StateStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
