//! TUI 应用主循环
//!
//! 进入全屏/原始模式，每帧同步 state_rx 中的 Session、处理后台结果、渲染，再把按键翻译为
//! Command 发给 Store 任务。定价与问答在 tokio::spawn 的任务中执行，结果经 UiEvent 通道返回。

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::assistant::PortfolioAssistant;
use crate::config::AppConfig;
use crate::core::{AppRuntime, Command, Session, SessionPhase, StoreHandle, Transition};
use crate::flows::{Certificate, ChatPanel, Faucet, MintFlow, MintPhase, OnboardingGuide};
use crate::oracle::{CostEstimator, MintCostRequest};
use crate::portfolio::{BlockId, Portfolio, PortfolioBlock};
use crate::ui::event::{AppEvent, EventHandler, TickGate, UiEvent};
use crate::ui::render::draw;

/// 挖矿进度 tick 周期，同时是键盘轮询超时
const TICK: Duration = Duration::from_millis(40);
/// 助手面板保留的消息条数
const TRANSCRIPT_CAPACITY: usize = 200;

/// UI 本地状态 + 与后台交互所需的句柄
pub struct App {
    pub portfolio: Arc<Portfolio>,
    store: StoreHandle,
    state_rx: watch::Receiver<Session>,
    estimator: Arc<dyn CostEstimator>,
    assistant: Arc<PortfolioAssistant>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    initial_balance: f64,

    pub session: Session,
    pub selected: usize,
    pub mint: MintFlow,
    pub faucet: Faucet,
    pub chat: ChatPanel,
    pub guide: OnboardingGuide,
    pub certificate: Option<Certificate>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: &AppConfig,
        portfolio: Arc<Portfolio>,
        store: StoreHandle,
        state_rx: watch::Receiver<Session>,
        estimator: Arc<dyn CostEstimator>,
        assistant: Arc<PortfolioAssistant>,
        ui_tx: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let session = state_rx.borrow().clone();
        Self {
            portfolio,
            store,
            state_rx,
            estimator,
            assistant,
            ui_tx,
            initial_balance: cfg.wallet.initial_balance,
            session,
            selected: 0,
            mint: MintFlow::new(cfg.pricing.cost_scale),
            faucet: Faucet::new(
                cfg.wallet.faucet_amount,
                Duration::from_secs(cfg.wallet.faucet_cooldown_secs),
            ),
            chat: ChatPanel::new(TRANSCRIPT_CAPACITY),
            guide: OnboardingGuide::default(),
            certificate: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn from_runtime(runtime: &AppRuntime, ui_tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self::new(
            &runtime.config,
            runtime.portfolio.clone(),
            runtime.store.handle.clone(),
            runtime.store.state_rx.clone(),
            runtime.estimator.clone(),
            runtime.assistant.clone(),
            ui_tx,
        )
    }

    /// 拉取最新 Session；Gas 变化时重新报价
    pub fn sync(&mut self) {
        self.session = self.state_rx.borrow_and_update().clone();
        self.mint.reprice(self.session.gas_price);
    }

    pub fn selected_block(&self) -> Option<&PortfolioBlock> {
        self.portfolio.blocks.get(self.selected)
    }

    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Estimate { ticket, result } => {
                self.mint.apply_estimate(ticket, result, self.session.gas_price);
            }
            UiEvent::Answer { generation, result } => {
                self.chat.receive(generation, result);
            }
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if self.chat.is_open() {
            self.chat_key(key);
            return;
        }
        if self.mint.is_open() {
            self.mint_key(key);
            return;
        }
        if self.certificate.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.certificate = None;
            }
            return;
        }
        match self.session.phase() {
            SessionPhase::Uninitialized => {
                if key.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            SessionPhase::Disconnected => self.landing_key(key).await,
            SessionPhase::Connected if OnboardingGuide::should_show(&self.session) => {
                self.guide_key(key).await
            }
            SessionPhase::Connected => self.dashboard_key(key).await,
        }
    }

    /// 推进挖矿动画；完成时提交 MintBlock
    pub async fn on_tick(&mut self) {
        let Some((block, total)) = self.mint.advance() else {
            return;
        };
        match self.store.request(Command::MintBlock { block, cost: total }).await {
            Some(Transition::Applied) => {
                self.sync();
                self.status = Some(format!("Block '{}' mined for {:.4} pETH", block, total));
                tracing::info!(%block, cost = total, "block minted");
                if self.portfolio.is_complete(&self.session.minted_blocks) {
                    self.certificate =
                        Certificate::issue(&self.portfolio, &self.session, chrono::Utc::now());
                }
            }
            Some(Transition::Unchanged(rejection)) => self.mint.fail(rejection.to_string()),
            None => self.mint.fail("Store unavailable"),
        }
        self.store.send(Command::SetMinting(false));
    }

    async fn dispatch(&mut self, command: Command) -> bool {
        match self.store.request(command).await {
            Some(Transition::Applied) => {
                self.sync();
                true
            }
            Some(Transition::Unchanged(rejection)) => {
                self.status = Some(rejection.to_string());
                false
            }
            None => {
                self.status = Some("Store unavailable".to_string());
                false
            }
        }
    }

    async fn landing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('c') => {
                if self
                    .dispatch(Command::Connect {
                        balance: self.initial_balance,
                    })
                    .await
                {
                    self.status = Some("Wallet connected".to_string());
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    async fn guide_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Right => {
                if self.guide.next() {
                    self.dispatch(Command::CompleteOnboarding).await;
                }
            }
            KeyCode::Left => self.guide.back(),
            KeyCode::Esc => {
                self.dispatch(Command::CompleteOnboarding).await;
            }
            _ => {}
        }
    }

    async fn dashboard_key(&mut self, key: KeyEvent) {
        let count = self.portfolio.blocks.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(count.saturating_sub(1))
            }
            KeyCode::Enter | KeyCode::Char('m') => {
                if let Some(id) = self.selected_block().map(|b| b.id) {
                    self.start_mint(id);
                }
            }
            KeyCode::Char('f') => match self.faucet.claim(&self.session, Instant::now()) {
                Ok(amount) => {
                    if self.dispatch(Command::ClaimFaucet { amount }).await {
                        self.status = Some(format!("Received {amount} pETH from the faucet"));
                    }
                }
                Err(e) => self.status = Some(e.to_string()),
            },
            KeyCode::Char('a') => {
                self.chat.toggle();
                self.store.send(Command::SetAssistantOpen(true));
            }
            KeyCode::Char('d') => {
                self.mint.dismiss();
                self.certificate = None;
                self.guide = OnboardingGuide::default();
                if self.dispatch(Command::Disconnect).await {
                    self.status = Some("Wallet disconnected".to_string());
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn start_mint(&mut self, id: BlockId) {
        if self.session.is_minted(id) {
            self.status = Some(format!("Block '{id}' already mined"));
            return;
        }
        let Some(block) = self.portfolio.get(id) else {
            return;
        };
        let request = MintCostRequest::from(block);
        let ticket = self.mint.open(id);
        let estimator = self.estimator.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let result = estimator.estimate(&request).await;
            let _ = tx.send(UiEvent::Estimate { ticket, result });
        });
    }

    fn mint_key(&mut self, key: KeyEvent) {
        let phase = self.mint.phase().clone();
        match (key.code, &phase) {
            (_, MintPhase::Mining { .. }) => {}
            (KeyCode::Enter | KeyCode::Char('y'), MintPhase::Confirm(_)) => {
                match self.mint.confirm(&self.session) {
                    Ok(()) => {
                        self.store.send(Command::SetMinting(true));
                    }
                    Err(e) => tracing::debug!("mint pre-check failed: {}", e),
                }
            }
            (KeyCode::Enter, MintPhase::Done | MintPhase::Error(_)) | (KeyCode::Esc, _) => {
                self.mint.dismiss()
            }
            _ => {}
        }
    }

    fn chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.chat.toggle();
                self.store.send(Command::SetAssistantOpen(false));
            }
            KeyCode::Enter => {
                if let Some(ticket) = self.chat.submit() {
                    let assistant = self.assistant.clone();
                    let minted = self.session.minted_blocks.clone();
                    let tx = self.ui_tx.clone();
                    tokio::spawn(async move {
                        let result = assistant
                            .answer(&ticket.question, &ticket.history, &minted)
                            .await;
                        let _ = tx.send(UiEvent::Answer {
                            generation: ticket.generation,
                            result,
                        });
                    });
                }
            }
            KeyCode::Backspace => {
                self.chat.input.pop();
            }
            KeyCode::Char(c) => self.chat.input.push(c),
            _ => {}
        }
    }
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(runtime: &AppRuntime) -> anyhow::Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let mut app = App::from_runtime(runtime, ui_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(TICK);
    let mut ticks = TickGate::new(TICK, Instant::now());
    let result = event_loop(&mut terminal, &mut app, &events, &mut ticks, &mut ui_rx).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &EventHandler,
    ticks: &mut TickGate,
    ui_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> anyhow::Result<()> {
    loop {
        app.sync();
        while let Ok(event) = ui_rx.try_recv() {
            app.handle_ui_event(event);
        }

        terminal.draw(|f| draw(f, app))?;

        match events.poll()? {
            Some(AppEvent::Quit) => break,
            Some(AppEvent::Key(key)) => app.handle_key(key).await,
            None => {}
        }
        if ticks.due(Instant::now()) {
            app.on_tick().await;
        }

        if app.should_quit {
            break;
        }
        tokio::task::yield_now().await;
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{spawn_store, Store, StorePolicy, StoreRuntime};
    use crate::llm::MockLlmClient;
    use crate::oracle::HeuristicCostEstimator;
    use crate::storage::MemoryStorage;

    fn app() -> (App, StoreRuntime, mpsc::UnboundedReceiver<UiEvent>) {
        let cfg = AppConfig::default();
        let portfolio = Arc::new(Portfolio::builtin().unwrap());
        let store = spawn_store(Store::open(
            Arc::new(MemoryStorage::new()),
            "k",
            StorePolicy::default(),
        ));
        let assistant = Arc::new(PortfolioAssistant::new(
            Arc::new(MockLlmClient::new()),
            portfolio.clone(),
            Duration::from_secs(1),
            10,
        ));
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let app = App::new(
            &cfg,
            portfolio,
            store.handle.clone(),
            store.state_rx.clone(),
            Arc::new(HeuristicCostEstimator),
            assistant,
            ui_tx,
        );
        (app, store, ui_rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    async fn connect_and_skip_guide(app: &mut App) {
        app.sync();
        app.handle_key(key(KeyCode::Enter)).await;
        assert!(app.session.is_authenticated);
        assert!(OnboardingGuide::should_show(&app.session));
        app.handle_key(key(KeyCode::Esc)).await;
        assert!(app.session.has_completed_onboarding);
    }

    #[tokio::test]
    async fn test_connect_then_mint_selected_block() {
        let (mut app, rt, mut ui_rx) = app();
        connect_and_skip_guide(&mut app).await;

        app.handle_key(key(KeyCode::Char('m'))).await;
        assert_eq!(app.mint.phase(), &MintPhase::Calculating);
        let event = ui_rx.recv().await.unwrap();
        app.handle_ui_event(event);
        assert!(matches!(app.mint.phase(), MintPhase::Confirm(_)));

        app.handle_key(key(KeyCode::Enter)).await;
        for _ in 0..25 {
            app.on_tick().await;
        }
        assert_eq!(app.mint.phase(), &MintPhase::Done);
        assert_eq!(app.session.minted_blocks, vec![BlockId::About]);
        assert!(app.session.wallet_balance < 10.0);
        rt.shutdown().await;
    }

    #[tokio::test]
    async fn test_faucet_and_cooldown() {
        let (mut app, rt, _ui_rx) = app();
        connect_and_skip_guide(&mut app).await;

        app.handle_key(key(KeyCode::Char('f'))).await;
        assert_eq!(app.session.wallet_balance, 20.0);
        app.handle_key(key(KeyCode::Char('f'))).await;
        assert_eq!(app.session.wallet_balance, 20.0);
        assert!(app.status.as_deref().unwrap_or("").contains("cooling down"));
        rt.shutdown().await;
    }

    #[tokio::test]
    async fn test_assistant_panel_round_trip() {
        let (mut app, rt, mut ui_rx) = app();
        connect_and_skip_guide(&mut app).await;

        app.handle_key(key(KeyCode::Char('a'))).await;
        assert!(app.chat.is_open());
        for c in "hi".chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
        app.handle_key(key(KeyCode::Enter)).await;
        let event = ui_rx.recv().await.unwrap();
        app.handle_ui_event(event);

        let last = app.chat.transcript().last().unwrap();
        assert_eq!(last.content, "Echo from Mock: hi");
        rt.shutdown().await;
    }

    #[tokio::test]
    async fn test_disconnect_keeps_progress() {
        let (mut app, rt, _ui_rx) = app();
        connect_and_skip_guide(&mut app).await;
        rt.handle
            .request(Command::MintBlock { block: BlockId::Skills, cost: 1.0 })
            .await;

        app.handle_key(key(KeyCode::Char('d'))).await;
        assert!(!app.session.is_authenticated);
        assert_eq!(app.session.minted_blocks, vec![BlockId::Skills]);
        assert!(app.session.has_completed_onboarding);
        rt.shutdown().await;
    }
}
