//! Channel token handling
//!
//! Subscribers authenticate to a run's status topic with a short-lived
//! token minted when the run starts. Only a SHA-256 digest of the token is
//! kept server-side; expired entries are purged lazily.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use flowgrid_core::RunId;
use sha2::{Digest, Sha256};

const TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Clone, Debug)]
struct TokenEntry {
    run_id: RunId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct ChannelTokens {
    entries: DashMap<String, TokenEntry>,
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl ChannelTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token scoped to one run's status channel.
    pub fn issue(&self, run_id: &RunId) -> String {
        self.purge_expired();
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.entries.insert(
            digest(&token),
            TokenEntry {
                run_id: run_id.clone(),
                expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
            },
        );
        token
    }

    /// A token is good for exactly the run it was issued for, until expiry.
    pub fn verify(&self, token: &str, run_id: &RunId) -> bool {
        match self.entries.get(&digest(token)) {
            Some(entry) => &entry.run_id == run_id && entry.expires_at > Utc::now(),
            None => false,
        }
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_for_its_run_only() {
        let tokens = ChannelTokens::new();
        let run_a = RunId::new("run-a");
        let run_b = RunId::new("run-b");
        let token = tokens.issue(&run_a);

        assert!(tokens.verify(&token, &run_a));
        assert!(!tokens.verify(&token, &run_b));
        assert!(!tokens.verify("forged", &run_a));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let tokens = ChannelTokens::new();
        let run = RunId::new("run-a");
        assert_ne!(tokens.issue(&run), tokens.issue(&run));
    }
}
