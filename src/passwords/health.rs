//! Vault-wide security score.

use std::collections::HashMap;

use super::strength::check_strength;
use crate::vault::DecryptedEntry;

/// Share of the score lost when every secret is weak.
const WEAK_PENALTY: f64 = 40.0;

/// Share of the score lost when every secret is reused.
const REUSED_PENALTY: f64 = 60.0;

/// Summary of weak and reused secrets across a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHealth {
    pub total: usize,
    pub weak: usize,
    /// Entries whose secret is also stored under another domain.
    pub reused: usize,
    /// 0..=100, higher is better.
    pub score: u8,
    /// Domains with a weak secret, sorted.
    pub weak_domains: Vec<String>,
    /// Domains sharing a secret with another domain, sorted.
    pub reused_domains: Vec<String>,
}

impl SecurityHealth {
    /// Score a set of decrypted entries.
    ///
    /// An empty vault scores 100. Otherwise the score is
    /// `100 - 40 * weak/total - 60 * reused/total`, floored at 0.
    pub fn assess(entries: &[DecryptedEntry]) -> Self {
        let total = entries.len();

        let mut weak_domains: Vec<String> = entries
            .iter()
            .filter(|e| check_strength(&e.secret).is_weak)
            .map(|e| e.domain.clone())
            .collect();
        weak_domains.sort();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for e in entries {
            *counts.entry(e.secret.as_str()).or_default() += 1;
        }
        let mut reused_domains: Vec<String> = entries
            .iter()
            .filter(|e| counts.get(e.secret.as_str()).is_some_and(|&n| n > 1))
            .map(|e| e.domain.clone())
            .collect();
        reused_domains.sort();

        let score = if total == 0 {
            100
        } else {
            let total_f = total as f64;
            let raw = 100.0
                - WEAK_PENALTY * weak_domains.len() as f64 / total_f
                - REUSED_PENALTY * reused_domains.len() as f64 / total_f;
            raw.clamp(0.0, 100.0) as u8
        };

        Self {
            total,
            weak: weak_domains.len(),
            reused: reused_domains.len(),
            score,
            weak_domains,
            reused_domains,
        }
    }
}
