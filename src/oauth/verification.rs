use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

use super::pkce::{generate_pkce, random_token, STATE_BYTES};

/// How long an authorization attempt stays redeemable.
pub const VERIFICATION_TTL_SECS: i64 = 10 * 60;

/// One in-flight authorization attempt.
#[derive(Debug, Clone)]
pub struct VerificationEntry {
    pub state: String,
    pub code_verifier: String,
    pub code_challenge: String,
    pub expiry: DateTime<Utc>,
}

/// In-memory PKCE verifiers keyed by `state`. Lost on restart.
pub struct VerificationStore {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, VerificationEntry>>,
}

impl std::fmt::Debug for VerificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationStore")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl VerificationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(VERIFICATION_TTL_SECS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Sweep expired entries, then allocate and insert a fresh one.
    pub fn create(&self) -> VerificationEntry {
        let now = self.clock.now();
        let pkce = generate_pkce();
        let entry = VerificationEntry {
            state: random_token(STATE_BYTES),
            code_verifier: pkce.code_verifier,
            code_challenge: pkce.code_challenge,
            expiry: now + self.ttl,
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let swept = sweep_expired(&mut entries, now);
        if swept > 0 {
            tracing::debug!(swept, "dropped expired verification entries");
        }
        entries.insert(entry.state.clone(), entry.clone());
        tracing::debug!(pending = entries.len(), "created verification entry");
        entry
    }

    /// Look up the entry for `state`. The entry stays in the store; an entry
    /// past its expiry is treated as absent even before it is swept.
    pub fn consume(&self, state: &str) -> Option<VerificationEntry> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(state)
            .filter(|entry| entry.expiry > now)
            .cloned()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        sweep_expired(&mut entries, now)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep_expired(entries: &mut HashMap<String, VerificationEntry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expiry > now);
    before - entries.len()
}
