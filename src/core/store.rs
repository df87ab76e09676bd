//! 应用状态 Store：命令 -> Reducer -> 新状态 -> 写穿存储 -> 通知订阅者
//!
//! Store 是唯一的写入方。open() 在接受任何命令前从存储读一次快照（这一次不回写）；
//! 之后任何命令（包括 Hydrate）只要改变了持久化子集就立即写回存储，
//! 写失败只记日志，内存状态仍然权威。

use std::sync::Arc;

use rand::thread_rng;
use tokio::sync::watch;

use crate::core::error::Rejection;
use crate::core::reducer::{reduce, Action, StorePolicy};
use crate::core::state::{Session, SessionPatch};
use crate::core::wallet::generate_address;
use crate::portfolio::BlockId;
use crate::storage::{PersistedSnapshot, StateStorage};

/// 表现层可发出的命令
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// 连接模拟钱包并设置初始余额
    Connect { balance: f64 },
    Disconnect,
    ClaimFaucet { amount: f64 },
    MintBlock { block: BlockId, cost: f64 },
    SetGasPrice(f64),
    CompleteOnboarding,
    Hydrate(SessionPatch),
    SetAssistantOpen(bool),
    SetMinting(bool),
}

/// 命令执行结果：已应用，或因某原因保持不变
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Applied,
    Unchanged(Rejection),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

pub struct Store {
    session: Session,
    storage: Arc<dyn StateStorage>,
    storage_key: String,
    policy: StorePolicy,
    notify: watch::Sender<Session>,
}

impl Store {
    /// 创建未初始化的 Store（不读存储）
    pub fn new(storage: Arc<dyn StateStorage>, storage_key: impl Into<String>, policy: StorePolicy) -> Self {
        let (notify, _) = watch::channel(Session::default());
        Self {
            session: Session::default(),
            storage,
            storage_key: storage_key.into(),
            policy,
            notify,
        }
    }

    /// 创建并立即从存储 Hydrate
    pub fn open(storage: Arc<dyn StateStorage>, storage_key: impl Into<String>, policy: StorePolicy) -> Self {
        let mut store = Self::new(storage, storage_key, policy);
        store.hydrate_from_storage();
        store
    }

    /// 读取存储快照并 Hydrate；读失败或快照损坏时以空补丁初始化
    pub fn hydrate_from_storage(&mut self) -> Transition {
        let patch = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => PersistedSnapshot::parse_patch(&raw).unwrap_or_else(|e| {
                tracing::warn!("Persisted state unreadable ({}), starting fresh", e);
                SessionPatch::default()
            }),
            Ok(None) => SessionPatch::default(),
            Err(e) => {
                tracing::warn!("Failed to load state from storage ({}), starting fresh", e);
                SessionPatch::default()
            }
        };
        self.apply(Command::Hydrate(patch), false)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.notify.subscribe()
    }

    pub fn dispatch(&mut self, command: Command) -> Transition {
        self.apply(command, true)
    }

    fn apply(&mut self, command: Command, write_through: bool) -> Transition {
        let action = self.to_action(command);
        match reduce(&self.session, &action, &self.policy) {
            Ok(next) => {
                let persisted_changed =
                    PersistedSnapshot::from(&self.session) != PersistedSnapshot::from(&next);
                tracing::debug!(action = ?action, "state transition applied");
                self.session = next;
                if persisted_changed && write_through {
                    self.persist();
                }
                self.notify.send_replace(self.session.clone());
                Transition::Applied
            }
            Err(rejection) => {
                tracing::debug!(action = ?action, %rejection, "state transition rejected");
                Transition::Unchanged(rejection)
            }
        }
    }

    fn to_action(&self, command: Command) -> Action {
        match command {
            Command::Connect { balance } => Action::ConnectWallet {
                address: generate_address(&mut thread_rng()),
                balance,
            },
            Command::Disconnect => Action::DisconnectWallet,
            Command::ClaimFaucet { amount } => Action::ClaimFaucet { amount },
            Command::MintBlock { block, cost } => Action::MintBlock { block, cost },
            Command::SetGasPrice(v) => Action::SetGasPrice(v),
            Command::CompleteOnboarding => Action::CompleteOnboarding,
            Command::Hydrate(patch) => Action::Hydrate(patch),
            Command::SetAssistantOpen(open) => Action::SetAssistantOpen(open),
            Command::SetMinting(minting) => Action::SetMinting(minting),
        }
    }

    /// 写穿存储；失败不影响内存状态
    fn persist(&self) {
        let snapshot = PersistedSnapshot::from(&self.session);
        let result = snapshot
            .to_json()
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.storage.set(&self.storage_key, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to save state to storage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::SessionPhase;
    use crate::storage::MemoryStorage;

    const KEY: &str = "test-state";

    fn open_store(storage: Arc<MemoryStorage>) -> Store {
        Store::open(storage, KEY, StorePolicy::default())
    }

    #[test]
    fn test_scenario_connect() {
        let mut store = open_store(Arc::new(MemoryStorage::new()));
        assert_eq!(store.session().phase(), SessionPhase::Disconnected);

        assert!(store.dispatch(Command::Connect { balance: 10.0 }).is_applied());
        let s = store.session();
        assert!(s.is_authenticated);
        assert_eq!(s.wallet_balance, 10.0);
        assert!(s.minted_blocks.is_empty());
        assert_eq!(s.wallet_address.len(), 42);
    }

    #[test]
    fn test_scenario_mint_repeat_and_faucet() {
        let mut store = open_store(Arc::new(MemoryStorage::new()));
        store.dispatch(Command::Connect { balance: 10.0 });

        let mint = Command::MintBlock { block: BlockId::About, cost: 2.5 };
        assert!(store.dispatch(mint.clone()).is_applied());
        assert_eq!(store.session().wallet_balance, 7.5);
        assert_eq!(store.session().minted_blocks, vec![BlockId::About]);

        let before = store.session().clone();
        assert_eq!(
            store.dispatch(mint),
            Transition::Unchanged(Rejection::AlreadyMinted(BlockId::About))
        );
        assert_eq!(store.session(), &before);

        store.dispatch(Command::ClaimFaucet { amount: 1.0 });
        assert_eq!(store.session().wallet_balance, 8.5);
    }

    #[test]
    fn test_scenario_disconnect_reconnect_preserves_minted() {
        let mut store = open_store(Arc::new(MemoryStorage::new()));
        store.dispatch(Command::Connect { balance: 10.0 });
        store.dispatch(Command::MintBlock { block: BlockId::About, cost: 1.0 });
        store.dispatch(Command::MintBlock { block: BlockId::Skills, cost: 1.0 });
        let first_address = store.session().wallet_address.clone();

        store.dispatch(Command::Disconnect);
        assert!(!store.session().is_authenticated);
        assert!(store.session().wallet_address.is_empty());

        store.dispatch(Command::Connect { balance: 10.0 });
        assert_eq!(store.session().minted_blocks, vec![BlockId::About, BlockId::Skills]);
        assert_eq!(store.session().wallet_balance, 10.0);
        assert_ne!(store.session().wallet_address, first_address);
    }

    #[test]
    fn test_write_through_excludes_ephemeral_fields() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(storage.clone());
        store.dispatch(Command::Connect { balance: 10.0 });
        store.dispatch(Command::SetGasPrice(0.0000005));
        store.dispatch(Command::SetAssistantOpen(true));

        let raw = storage.get(KEY).unwrap().unwrap();
        assert!(raw.contains("\"isAuthenticated\":true"));
        assert!(!raw.contains("gasPrice"));
        assert!(!raw.contains("assistant"));
    }

    #[test]
    fn test_gas_price_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(storage.clone());
        store.dispatch(Command::SetGasPrice(0.0000003));
        assert!(storage.get(KEY).unwrap().is_none());
        assert_eq!(store.session().gas_price, 0.0000003);
    }

    #[test]
    fn test_reload_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(storage.clone());
        store.dispatch(Command::Connect { balance: 10.0 });
        store.dispatch(Command::MintBlock { block: BlockId::Projects, cost: 0.3 });
        store.dispatch(Command::CompleteOnboarding);
        store.dispatch(Command::SetGasPrice(0.0000007));
        let saved = store.session().clone();

        let reopened = open_store(storage);
        let s = reopened.session();
        assert!(s.is_authenticated);
        assert_eq!(s.wallet_address, saved.wallet_address);
        assert_eq!(s.wallet_balance, saved.wallet_balance);
        assert_eq!(s.minted_blocks, saved.minted_blocks);
        assert!(s.has_completed_onboarding);
        assert_eq!(s.gas_price, 0.0);
    }

    #[test]
    fn test_read_failure_falls_back_to_default() {
        let storage = Arc::new(MemoryStorage::new().with_entry(KEY, "{\"isAuthenticated\":true}"));
        storage.set_fail_reads(true);
        let store = open_store(storage);
        assert_eq!(store.session().phase(), SessionPhase::Disconnected);
        assert!(store.session().minted_blocks.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_default() {
        let storage = Arc::new(MemoryStorage::new().with_entry(KEY, "{{{"));
        let store = open_store(storage);
        assert!(store.session().is_initialized);
        assert!(!store.session().is_authenticated);
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let mut store = open_store(storage.clone());
        assert!(store.dispatch(Command::Connect { balance: 10.0 }).is_applied());
        assert!(store.dispatch(Command::MintBlock { block: BlockId::About, cost: 1.0 }).is_applied());
        assert_eq!(store.session().wallet_balance, 9.0);
        storage.set_fail_writes(false);
        assert!(storage.get(KEY).unwrap().is_none());
    }

    #[test]
    fn test_uninitialized_store_rejects_commands() {
        let mut store = Store::new(Arc::new(MemoryStorage::new()), KEY, StorePolicy::default());
        assert_eq!(
            store.dispatch(Command::Connect { balance: 1.0 }),
            Transition::Unchanged(Rejection::NotInitialized)
        );
        assert!(store.hydrate_from_storage().is_applied());
        assert!(store.dispatch(Command::Connect { balance: 1.0 }).is_applied());
    }

    #[test]
    fn test_startup_hydrate_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let _store = open_store(storage.clone());
        assert!(storage.get(KEY).unwrap().is_none());
    }

    #[test]
    fn test_later_hydrate_is_written_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(storage.clone());
        store.dispatch(Command::Connect { balance: 10.0 });

        let patch = SessionPatch {
            minted_blocks: Some(vec![BlockId::Contact]),
            ..SessionPatch::default()
        };
        assert!(store.dispatch(Command::Hydrate(patch)).is_applied());
        assert!(storage.get(KEY).unwrap().unwrap().contains("contact"));

        let reopened = open_store(storage);
        assert_eq!(reopened.session().minted_blocks, vec![BlockId::Contact]);
        assert!(reopened.session().is_authenticated);
    }

    #[test]
    fn test_connect_while_connected_replaces_wallet() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(storage.clone());
        store.dispatch(Command::Connect { balance: 10.0 });
        store.dispatch(Command::MintBlock { block: BlockId::About, cost: 1.0 });
        let first_address = store.session().wallet_address.clone();

        assert!(store.dispatch(Command::Connect { balance: 3.0 }).is_applied());
        assert_eq!(store.session().wallet_balance, 3.0);
        assert_ne!(store.session().wallet_address, first_address);
        assert_eq!(store.session().minted_blocks, vec![BlockId::About]);
        assert!(storage.get(KEY).unwrap().unwrap().contains("\"walletBalance\":3"));
    }

    #[test]
    fn test_subscribers_see_applied_transitions() {
        let mut store = open_store(Arc::new(MemoryStorage::new()));
        let rx = store.subscribe();
        store.dispatch(Command::Connect { balance: 4.0 });
        assert_eq!(rx.borrow().wallet_balance, 4.0);
    }
}
