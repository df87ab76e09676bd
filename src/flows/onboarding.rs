//! 新手引导：四步说明，完成后发送 CompleteOnboarding

use crate::core::Session;

pub struct OnboardingStep {
    pub title: &'static str,
    pub description: &'static str,
}

pub static ONBOARDING_STEPS: [OnboardingStep; 4] = [
    OnboardingStep {
        title: "Welcome to the Decentralized Portfolio!",
        description: "This is a simulated blockchain experience. You mine parts of the portfolio to reveal the content, just like discovering blocks on a chain.",
    },
    OnboardingStep {
        title: "Mine Blocks to View Content",
        description: "Each card is a block on the personal chain. Select one and press 'm' to spend a little pETH (play-Ether) and unlock the content inside.",
    },
    OnboardingStep {
        title: "Manage Your pETH Wallet",
        description: "Your simulated wallet holds pETH. Keep an eye on the balance and the gas fee in the header. If you run low, press 'f' for the faucet.",
    },
    OnboardingStep {
        title: "Ask Me Anything!",
        description: "Press 'a' to open the AI assistant. It answers questions using the blocks you have already mined.",
    },
];

/// 引导进度；next 在最后一步返回 true 表示完成
#[derive(Debug, Default)]
pub struct OnboardingGuide {
    step: usize,
}

impl OnboardingGuide {
    /// 已连接且尚未完成引导时显示
    pub fn should_show(session: &Session) -> bool {
        session.is_authenticated && !session.has_completed_onboarding
    }

    pub fn current(&self) -> &'static OnboardingStep {
        &ONBOARDING_STEPS[self.step.min(ONBOARDING_STEPS.len() - 1)]
    }

    pub fn position(&self) -> (usize, usize) {
        (self.step + 1, ONBOARDING_STEPS.len())
    }

    pub fn next(&mut self) -> bool {
        if self.step + 1 >= ONBOARDING_STEPS.len() {
            self.step = 0;
            true
        } else {
            self.step += 1;
            false
        }
    }

    pub fn back(&mut self) {
        self.step = self.step.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_finishes_after_four_steps() {
        let mut guide = OnboardingGuide::default();
        assert_eq!(guide.position(), (1, 4));
        assert!(!guide.next());
        assert!(!guide.next());
        guide.back();
        assert_eq!(guide.position(), (2, 4));
        assert!(!guide.next());
        assert!(!guide.next());
        assert!(guide.next());
    }

    #[test]
    fn test_should_show() {
        let mut s = Session {
            is_initialized: true,
            is_authenticated: true,
            ..Session::default()
        };
        assert!(OnboardingGuide::should_show(&s));
        s.has_completed_onboarding = true;
        assert!(!OnboardingGuide::should_show(&s));
    }
}
