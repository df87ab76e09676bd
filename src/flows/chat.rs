//! 助手面板：开关状态、对话记录、单个进行中的提问
//!
//! 面板关闭或重新提问后，旧回复按 generation 丢弃。

use std::collections::VecDeque;

use crate::core::CollaboratorError;
use crate::llm::Message;

pub const ERROR_REPLY: &str = "Sorry, something went wrong. Please try again.";
pub const EMPTY_REPLY: &str = "Sorry, I couldn't get a response. Please try again.";

/// 发往助手的一次提问
#[derive(Clone, Debug, PartialEq)]
pub struct ChatTicket {
    pub generation: u64,
    pub question: String,
    /// 提问之前的对话记录
    pub history: Vec<Message>,
}

#[derive(Debug)]
pub struct ChatPanel {
    open: bool,
    transcript: VecDeque<Message>,
    capacity: usize,
    pending: Option<u64>,
    generation: u64,
    pub input: String,
}

impl ChatPanel {
    pub fn new(capacity: usize) -> Self {
        Self {
            open: false,
            transcript: VecDeque::new(),
            capacity: capacity.max(2),
            pending: None,
            generation: 0,
            input: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.transcript.iter()
    }

    /// 切换开关，返回新状态；关闭时作废进行中的提问
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        if !self.open {
            self.generation += 1;
            self.pending = None;
        }
        self.open
    }

    fn push(&mut self, message: Message) {
        self.transcript.push_back(message);
        while self.transcript.len() > self.capacity {
            self.transcript.pop_front();
        }
    }

    /// 提交当前输入；面板关闭、输入为空或已有进行中的提问时返回 None
    pub fn submit(&mut self) -> Option<ChatTicket> {
        let question = self.input.trim().to_string();
        if !self.open || question.is_empty() || self.pending.is_some() {
            return None;
        }
        self.input.clear();
        let history: Vec<Message> = self.transcript.iter().cloned().collect();
        self.push(Message::user(question.clone()));
        self.generation += 1;
        self.pending = Some(self.generation);
        Some(ChatTicket {
            generation: self.generation,
            question,
            history,
        })
    }

    /// 接收回复；过期回复返回 false 且不改变记录
    pub fn receive(&mut self, generation: u64, result: Result<String, CollaboratorError>) -> bool {
        if !self.open || self.pending != Some(generation) {
            tracing::debug!(generation, "stale assistant answer dropped");
            return false;
        }
        self.pending = None;
        let reply = match result {
            Ok(answer) if answer.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Assistant request failed: {}", e);
                ERROR_REPLY.to_string()
            }
        };
        self.push(Message::assistant(reply));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn open_panel() -> ChatPanel {
        let mut panel = ChatPanel::new(20);
        panel.toggle();
        panel
    }

    #[test]
    fn test_submit_and_receive() {
        let mut panel = open_panel();
        panel.input = "  What do you build?  ".into();
        let ticket = panel.submit().unwrap();
        assert_eq!(ticket.question, "What do you build?");
        assert!(ticket.history.is_empty());
        assert!(panel.is_waiting());
        assert!(panel.submit().is_none());

        assert!(panel.receive(ticket.generation, Ok("Secure systems.".into())));
        let roles: Vec<Role> = panel.transcript().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);

        panel.input = "More?".into();
        let ticket = panel.submit().unwrap();
        assert_eq!(ticket.history.len(), 2);
    }

    #[test]
    fn test_error_and_empty_replies() {
        let mut panel = open_panel();
        panel.input = "a".into();
        let t = panel.submit().unwrap();
        panel.receive(t.generation, Err(CollaboratorError::Llm("down".into())));
        panel.input = "b".into();
        let t = panel.submit().unwrap();
        panel.receive(t.generation, Ok("   ".into()));

        let replies: Vec<&str> = panel
            .transcript()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(replies, vec![ERROR_REPLY, EMPTY_REPLY]);
    }

    #[test]
    fn test_answer_after_close_is_dropped() {
        let mut panel = open_panel();
        panel.input = "q".into();
        let t = panel.submit().unwrap();
        panel.toggle();
        panel.toggle();
        assert!(!panel.receive(t.generation, Ok("late".into())));
        assert!(!panel.is_waiting());
        assert_eq!(panel.transcript().count(), 1);
    }

    #[test]
    fn test_transcript_is_bounded() {
        let mut panel = ChatPanel::new(4);
        panel.toggle();
        for i in 0..5 {
            panel.input = format!("q{i}");
            let t = panel.submit().unwrap();
            panel.receive(t.generation, Ok(format!("a{i}")));
        }
        let first = panel.transcript().next().unwrap();
        assert_eq!(first.content, "q3");
        assert_eq!(panel.transcript().count(), 4);
    }

    #[test]
    fn test_closed_panel_does_not_submit() {
        let mut panel = ChatPanel::new(4);
        panel.input = "hello".into();
        assert!(panel.submit().is_none());
    }
}
