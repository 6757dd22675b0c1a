// Copyright 2026 Grzegorz Blach
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Short-lived, single-use challenges keyed by subject identity.

use std::sync::{Arc, Weak};
use std::time::Duration;

use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::DEFAULT_CHALLENGE_TTL;

/// Number of random bytes in a challenge.
pub const CHALLENGE_LEN: usize = 32;

// Keeps `now + ttl` far from the chrono range limit.
const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Shortest period the background sweep runs at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// A server-issued challenge awaiting a ceremony response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// The subject the challenge was issued for.
    pub subject_id: String,

    /// The raw random bytes.
    pub value: Vec<u8>,

    /// When the challenge was issued.
    pub created_at: DateTime<Utc>,

    /// After this instant the challenge is treated as absent.
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    /// Returns the challenge as it travels on the wire (base64url, no padding).
    pub fn encoded(&self) -> String {
        crate::base64_encode(&self.value)
    }

    /// Whether the challenge is still usable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// In-memory store of pending challenges, one per subject.
///
/// Issuing a new challenge for a subject overwrites any unconsumed one, and
/// consuming removes the entry atomically whether or not the caller's
/// verification later succeeds. A response signed over an overwritten
/// challenge therefore fails with a challenge mismatch instead of verifying
/// against the newer value.
pub struct ChallengeStore {
    entries: DashMap<String, Challenge>,
    ttl: chrono::Duration,
    rng: SystemRandom,
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_TTL)
    }
}

impl ChallengeStore {
    /// Creates an empty store whose challenges live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl.min(MAX_TTL)).unwrap_or(chrono::Duration::zero()),
            rng: SystemRandom::new(),
        }
    }

    /// Issues a fresh challenge for `subject_id`.
    pub fn issue(&self, subject_id: &str) -> Challenge {
        self.issue_at(subject_id, Utc::now())
    }

    /// Issues a fresh challenge for `subject_id` as of `now`.
    pub fn issue_at(&self, subject_id: &str, now: DateTime<Utc>) -> Challenge {
        self.sweep_expired(now);

        let mut value = vec![0u8; CHALLENGE_LEN];
        self.rng
            .fill(&mut value)
            .expect("Failed to generate random challenge");

        let challenge = Challenge {
            subject_id: subject_id.to_string(),
            value,
            created_at: now,
            expires_at: now + self.ttl,
        };

        if self
            .entries
            .insert(subject_id.to_string(), challenge.clone())
            .is_some()
        {
            debug!(subject = %subject_id, "Replaced unconsumed challenge");
        } else {
            debug!(subject = %subject_id, "Issued challenge");
        }

        challenge
    }

    /// Removes and returns the pending challenge for `subject_id`.
    ///
    /// Returns `None` if there is none or it has expired.
    pub fn consume(&self, subject_id: &str) -> Option<Challenge> {
        self.consume_at(subject_id, Utc::now())
    }

    /// Removes and returns the pending challenge for `subject_id` as of `now`.
    pub fn consume_at(&self, subject_id: &str, now: DateTime<Utc>) -> Option<Challenge> {
        let (_, challenge) = self.entries.remove(subject_id)?;
        if challenge.is_live(now) {
            debug!(subject = %subject_id, "Consumed challenge");
            Some(challenge)
        } else {
            debug!(subject = %subject_id, "Discarded expired challenge");
            None
        }
    }

    /// Purges every challenge expired as of `now`, returning how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;
        self.entries.retain(|_, challenge| {
            let live = challenge.is_live(now);
            if !live {
                purged += 1;
            }
            live
        });
        if purged > 0 {
            debug!(purged, "Swept expired challenges");
        }
        purged
    }

    /// Number of pending challenges, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no challenges are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns a single background task that sweeps the store every `period`.
    ///
    /// `period` is raised to [`MIN_SWEEP_INTERVAL`] if shorter. The task holds
    /// only a weak reference and exits once the store is dropped. Must be
    /// called from within a Tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = period.max(MIN_SWEEP_INTERVAL);
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.sweep_expired(Utc::now());
                    }
                    None => break,
                }
            }
        })
    }
}

impl std::fmt::Debug for ChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeStore")
            .field("pending", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
