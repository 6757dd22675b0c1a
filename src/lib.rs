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

//! WebAuthn credential engine for the dispatch back office.
//!
//! Riders, drivers and dispatchers sign in with platform passkeys. This crate
//! implements the server side of both WebAuthn ceremonies: issuing single-use
//! challenges, decoding the binary attestation and assertion payloads an
//! authenticator produces, verifying them, and enforcing the signature
//! counter so a cloned credential cannot replay an old assertion.
//!
//! Persistence stays with the caller. A ceremony returns a plain result that
//! the caller applies to a [`Credential`] through its [`CredentialStore`].
//!
//! # Example
//!
//! ```rust
//! use dispatch_webauthn::{EngineConfig, MemoryCredentialStore, CredentialStore, Subject, WebauthnEngine};
//!
//! let engine = WebauthnEngine::new(EngineConfig::new(
//!     "example.com",
//!     "https://example.com",
//!     "Example Dispatch",
//! ));
//! let store = MemoryCredentialStore::new();
//! let subject = Subject::new("driver-42", "driver42@example.com", "Driver 42");
//!
//! // Registration: send the options to the browser as JSON.
//! let options = engine.begin_registration(&subject, &store.list_for_subject(&subject.id));
//! assert_eq!(options.pub_key_cred_params[0].alg, -7);
//! # /*
//! let attestation = engine.complete_registration(&response, &subject.id)?;
//! store.create(&subject.id, attestation)?;
//!
//! // Authentication.
//! let options = engine.begin_authentication(&subject.id, &allowed_ids);
//! let mut credential = store.find_by_credential_id(&id).ok_or("unknown credential")?;
//! if credential.is_active() {
//!     let result = engine.complete_authentication(
//!         &assertion, &subject.id, &credential.public_key, credential.counter,
//!     )?;
//!     credential.record_use(result.new_counter())?;
//!     store.save(&credential)?;
//! }
//! # */
//! ```
//!
//! # Signature verification
//!
//! Assertions are checked with ECDSA P-256/SHA-256 (ES256) or
//! RSASSA-PKCS1-v1_5/SHA-256 (RS256) over
//! `authenticatorData || SHA-256(clientDataJSON)`. The legacy dispatch service
//! this engine replaces computed that message but never verified it, accepting
//! any assertion whose flags and counter looked right.

mod authentication;
mod authenticator_data;
pub mod cbor;
mod challenge;
mod client_data;
mod config;
mod cose;
mod credential;
mod error;
mod registration;
mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tokio::task::JoinHandle;

pub use authentication::{AssertionOptions, AssertionResponse, AssertionResult};
pub use authenticator_data::{
    rp_id_hash, AttestedCredentialData, AuthenticatorData, AuthenticatorFlags, MIN_AUTH_DATA_LEN,
};
pub use challenge::{Challenge, ChallengeStore, CHALLENGE_LEN, MIN_SWEEP_INTERVAL};
pub use client_data::{ClientData, ClientDataType};
pub use config::EngineConfig;
pub use cose::{PublicKey, COSE_ALG_ES256, COSE_ALG_RS256};
pub use credential::{
    Credential, CredentialStatus, CredentialStore, Identity, IdentityLookup,
    MemoryCredentialStore,
};
pub use error::{Error, ErrorKind, Result};
pub use registration::{AttestationResult, RegistrationOptions, RegistrationResponse};
pub use types::*;

/// Entry point for both WebAuthn ceremonies.
///
/// Holds the relying party configuration and the challenge store. Share one
/// instance across request handlers; every method takes `&self`.
#[derive(Debug)]
pub struct WebauthnEngine {
    pub config: EngineConfig,
    challenges: Arc<ChallengeStore>,
}

impl WebauthnEngine {
    /// Creates an engine with an empty challenge store.
    pub fn new(config: EngineConfig) -> Self {
        let challenges = Arc::new(ChallengeStore::new(config.challenge_ttl));
        Self { config, challenges }
    }

    /// The engine's challenge store.
    pub fn challenges(&self) -> &ChallengeStore {
        &self.challenges
    }

    /// Starts the background task that purges expired challenges every
    /// `config.sweep_interval`. Call once, from within a Tokio runtime.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        self.challenges.spawn_sweeper(self.config.sweep_interval)
    }
}

/// Encodes binary data as base64url (without padding).
#[inline]
pub fn base64_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes a base64url-encoded string (without padding).
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] if the input is not valid base64url.
#[inline]
pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))
}
