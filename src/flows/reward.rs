//! 完成证书：全部区块铸造后颁发，交易哈希仅作展示

use chrono::{DateTime, Utc};

use crate::core::wallet::certificate_tx_hash;
use crate::core::Session;
use crate::portfolio::Portfolio;

#[derive(Clone, Debug, PartialEq)]
pub struct Certificate {
    pub owner: String,
    pub wallet_address: String,
    pub tx_hash: String,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    /// 所有区块均已铸造时颁发，否则返回 None
    pub fn issue(portfolio: &Portfolio, session: &Session, now: DateTime<Utc>) -> Option<Self> {
        if !session.is_authenticated || !portfolio.is_complete(&session.minted_blocks) {
            return None;
        }
        Some(Self {
            owner: portfolio.owner.name.clone(),
            wallet_address: session.wallet_address.clone(),
            tx_hash: certificate_tx_hash(&session.wallet_address, now.timestamp_millis()),
            issued_at: now,
        })
    }

    pub fn text_lines(&self) -> Vec<String> {
        vec![
            "CERTIFICATE OF COMPLETION".to_string(),
            "Proof of Exploration".to_string(),
            String::new(),
            format!("Issued by {}", self.owner),
            format!("To wallet {}", self.wallet_address),
            format!("Tx Hash: {}", self.tx_hash),
            format!("Date: {}", self.issued_at.format("%Y-%m-%d %H:%M UTC")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_issue_only_when_complete() {
        let portfolio = Portfolio::builtin().unwrap();
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut session = Session {
            is_initialized: true,
            is_authenticated: true,
            wallet_address: "0xabcdef0123456789abcdef0123456789abcdef01".into(),
            ..Session::default()
        };
        session.minted_blocks = portfolio.ids()[..1].to_vec();
        assert!(Certificate::issue(&portfolio, &session, now).is_none());

        session.minted_blocks = portfolio.ids();
        let cert = Certificate::issue(&portfolio, &session, now).unwrap();
        assert_eq!(cert.owner, portfolio.owner.name);
        assert!(cert.tx_hash.starts_with("0xabcdef01"));
        assert_eq!(cert.tx_hash.len(), 2 + 8 + 4);
    }
}
