//! 事件处理
//!
//! 轮询 crossterm 键盘事件：Ctrl+C / Ctrl+Q 转为 Quit，其余按键交给 App；
//! 后台协作方任务（定价、问答）的结果通过 UiEvent 通道回到主循环。

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::CollaboratorError;
use crate::flows::MintTicket;

/// 终端事件：退出快捷键或原始 KeyEvent
#[derive(Debug, Clone)]
pub enum AppEvent {
    Quit,
    Key(KeyEvent),
}

/// 后台任务完成后发回 UI 的结果
#[derive(Debug)]
pub enum UiEvent {
    Estimate {
        ticket: MintTicket,
        result: Result<f64, CollaboratorError>,
    },
    Answer {
        generation: u64,
        result: Result<String, CollaboratorError>,
    },
}

/// 按墙钟节拍放行动画 tick；按键触发的额外循环不会加快进度
pub struct TickGate {
    period: Duration,
    last: Instant,
}

impl TickGate {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, last: now }
    }

    /// 距上次放行已满一个周期时返回 true
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// 键盘轮询器；timeout 与挖矿 tick 周期相同
pub struct EventHandler {
    tick: Duration,
}

impl EventHandler {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(self.tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(Self::classify(key)));
                }
            }
        }
        Ok(None)
    }

    fn classify(key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                AppEvent::Quit
            }
            _ => AppEvent::Key(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_shortcuts_quit() {
        let ev = EventHandler::classify(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(matches!(ev, AppEvent::Quit));
        let ev = EventHandler::classify(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(matches!(ev, AppEvent::Key(_)));
    }

    #[test]
    fn test_tick_gate_ignores_extra_passes() {
        let start = Instant::now();
        let mut gate = TickGate::new(Duration::from_millis(40), start);
        assert!(!gate.due(start));
        assert!(!gate.due(start + Duration::from_millis(10)));
        assert!(!gate.due(start + Duration::from_millis(39)));
        assert!(gate.due(start + Duration::from_millis(40)));
        // 连续按键带来的循环在同一周期内不再放行
        for ms in [41, 50, 60, 79] {
            assert!(!gate.due(start + Duration::from_millis(ms)));
        }
        assert!(gate.due(start + Duration::from_millis(80)));
    }
}
