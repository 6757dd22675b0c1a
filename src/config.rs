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

//! Relying party configuration.

use std::time::Duration;

/// Default lifetime of an issued challenge (5 minutes).
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Default client-side ceremony timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default period of the background challenge sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a [`WebauthnEngine`](crate::WebauthnEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The relying party identifier (typically the domain, e.g. "example.com").
    pub rp_id: String,

    /// The human-readable relying party name.
    pub rp_name: String,

    /// The expected origin of client data (e.g. `https://example.com`).
    pub origin: String,

    /// How long an issued challenge stays valid.
    pub challenge_ttl: Duration,

    /// Client-side timeout advertised in ceremony options, in milliseconds.
    pub timeout_ms: u64,

    /// How often the background sweep purges expired challenges.
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Dispatch".to_string(),
            origin: "http://localhost:3000".to_string(),
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for the given relying party with default timings.
    pub fn new(rp_id: &str, origin: &str, rp_name: &str) -> Self {
        Self {
            rp_id: rp_id.to_string(),
            rp_name: rp_name.to_string(),
            origin: origin.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Absent or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rp_id = std::env::var("WEBAUTHN_RP_ID").unwrap_or(defaults.rp_id);
        let rp_name = std::env::var("WEBAUTHN_RP_NAME").unwrap_or(defaults.rp_name);
        let origin = std::env::var("WEBAUTHN_ORIGIN").unwrap_or(defaults.origin);

        let challenge_ttl = std::env::var("WEBAUTHN_CHALLENGE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.challenge_ttl);

        let timeout_ms = std::env::var("WEBAUTHN_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_ms);

        let sweep_interval = std::env::var("WEBAUTHN_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        Self {
            rp_id,
            rp_name,
            origin,
            challenge_ttl,
            timeout_ms,
            sweep_interval,
        }
    }
}
