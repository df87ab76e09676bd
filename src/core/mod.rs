//! 核心层：会话状态、纯 Reducer、Store（写穿存储 + 通知）、钱包工具、后台编排

pub mod error;
pub mod orchestrator;
pub mod reducer;
pub mod state;
pub mod store;
pub mod wallet;

pub use error::{CollaboratorError, Rejection};
pub use orchestrator::{create_runtime, spawn_store, AppRuntime, StoreHandle, StoreRuntime};
pub use reducer::{reduce, Action, StorePolicy};
pub use state::{Session, SessionPatch, SessionPhase, TransientFlags};
pub use store::{Command, Store, Transition};
