//! Store / 存储 / 协作方集成测试

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dappfolio::assistant::PortfolioAssistant;
    use dappfolio::core::{spawn_store, Command, Store, StorePolicy, Transition};
    use dappfolio::llm::MockLlmClient;
    use dappfolio::oracle::{CostEstimator, LlmCostEstimator, MintCostRequest};
    use dappfolio::portfolio::{BlockId, Portfolio};
    use dappfolio::storage::{FileStorage, StateStorage};

    const KEY: &str = "dappfolio-portfolio-state";

    #[tokio::test]
    async fn test_file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let rt = spawn_store(Store::open(
            Arc::new(FileStorage::new(&path)),
            KEY,
            StorePolicy::default(),
        ));
        rt.handle.request(Command::Connect { balance: 10.0 }).await;
        rt.handle
            .request(Command::MintBlock { block: BlockId::About, cost: 2.5 })
            .await;
        rt.handle.request(Command::CompleteOnboarding).await;
        rt.handle.request(Command::SetGasPrice(0.0000004)).await;
        let before = rt.shutdown().await.unwrap().session().clone();

        let reopened = Store::open(Arc::new(FileStorage::new(&path)), KEY, StorePolicy::default());
        let after = reopened.session();
        assert!(after.is_initialized);
        assert!(after.is_authenticated);
        assert_eq!(after.wallet_address, before.wallet_address);
        assert_eq!(after.wallet_balance, 7.5);
        assert_eq!(after.minted_blocks, vec![BlockId::About]);
        assert!(after.has_completed_onboarding);
        assert_eq!(after.gas_price, 0.0);

        let raw = FileStorage::new(&path).get(KEY).unwrap().unwrap();
        assert!(!raw.contains("gasPrice"));
        assert!(raw.contains("mintedBlocks"));
    }

    #[tokio::test]
    async fn test_disconnect_reconnect_preserves_progress() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path().join("s.json")));
        let rt = spawn_store(Store::open(storage, KEY, StorePolicy::default()));
        let h = &rt.handle;

        h.request(Command::Connect { balance: 10.0 }).await;
        h.request(Command::MintBlock { block: BlockId::About, cost: 1.0 }).await;
        h.request(Command::MintBlock { block: BlockId::Skills, cost: 1.0 }).await;
        assert_eq!(h.request(Command::Disconnect).await, Some(Transition::Applied));
        assert!(h.request(Command::ClaimFaucet { amount: 1.0 }).await.map_or(false, |t| !t.is_applied()));
        h.request(Command::Connect { balance: 10.0 }).await;

        let session = rt.state_rx.borrow().clone();
        assert_eq!(session.minted_blocks, vec![BlockId::About, BlockId::Skills]);
        assert_eq!(session.wallet_balance, 10.0);
        rt.shutdown().await;
    }

    #[tokio::test]
    async fn test_assistant_never_sees_unminted_content() {
        let portfolio = Arc::new(Portfolio::builtin().unwrap());
        let llm = Arc::new(MockLlmClient::new());
        let assistant =
            PortfolioAssistant::new(llm.clone(), portfolio.clone(), Duration::from_secs(1), 10);

        assistant
            .answer("What projects have you built?", &[], &[BlockId::About])
            .await
            .unwrap();

        let prompt: String = llm.received()[0]
            .iter()
            .map(|m| m.content.clone())
            .collect();
        let projects = portfolio.get(BlockId::Projects).unwrap();
        for p in &projects.content.projects {
            assert!(!prompt.contains(&p.title));
            assert!(!prompt.contains(&p.description));
        }
        let contact = portfolio.get(BlockId::Contact).unwrap();
        for c in &contact.content.contact {
            assert!(!prompt.contains(&c.value));
        }
    }

    #[tokio::test]
    async fn test_estimator_timeout_is_distinguishable() {
        let llm = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(500)));
        let estimator = LlmCostEstimator::new(llm, Duration::from_millis(30));
        let portfolio = Portfolio::builtin().unwrap();
        let request = MintCostRequest::from(portfolio.get(BlockId::Skills).unwrap());

        let err = estimator.estimate(&request).await.unwrap_err();
        assert!(matches!(err, dappfolio::core::CollaboratorError::Timeout(_)));
    }
}
