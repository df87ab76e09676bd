//! 水龙头：固定领取额度 + 冷却时间

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::Session;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaucetError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Faucet cooling down, {}s left", .remaining.as_secs())]
    CoolingDown { remaining: Duration },
}

#[derive(Debug)]
pub struct Faucet {
    amount: f64,
    cooldown: Duration,
    last_claim: Option<Instant>,
}

impl Faucet {
    pub fn new(amount: f64, cooldown: Duration) -> Self {
        Self {
            amount,
            cooldown,
            last_claim: None,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// 剩余冷却时间；可领取时为 None
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_claim?;
        let elapsed = now.saturating_duration_since(last);
        self.cooldown.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// 领取：成功时记录领取时间并返回额度，调用方据此发送 ClaimFaucet
    pub fn claim(&mut self, session: &Session, now: Instant) -> Result<f64, FaucetError> {
        if !session.is_authenticated {
            return Err(FaucetError::NotConnected);
        }
        if let Some(remaining) = self.remaining(now) {
            return Err(FaucetError::CoolingDown { remaining });
        }
        self.last_claim = Some(now);
        Ok(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> Session {
        Session {
            is_initialized: true,
            is_authenticated: true,
            ..Session::default()
        }
    }

    #[test]
    fn test_claim_then_cooldown() {
        let mut faucet = Faucet::new(10.0, Duration::from_secs(30));
        let t0 = Instant::now();
        assert_eq!(faucet.claim(&connected(), t0), Ok(10.0));

        let err = faucet.claim(&connected(), t0 + Duration::from_secs(10)).unwrap_err();
        assert_eq!(
            err,
            FaucetError::CoolingDown {
                remaining: Duration::from_secs(20)
            }
        );
        assert_eq!(faucet.claim(&connected(), t0 + Duration::from_secs(30)), Ok(10.0));
    }

    #[test]
    fn test_claim_requires_connection() {
        let mut faucet = Faucet::new(10.0, Duration::from_secs(30));
        assert_eq!(
            faucet.claim(&Session::default(), Instant::now()),
            Err(FaucetError::NotConnected)
        );
        assert!(faucet.remaining(Instant::now()).is_none());
    }
}
