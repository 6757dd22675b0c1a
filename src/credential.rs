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

//! Credential lifecycle and the storage/identity collaborator contracts.
//!
//! The engine never persists anything itself. After a successful ceremony the
//! caller creates or updates a [`Credential`] through a [`CredentialStore`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cose::PublicKey;
use crate::error::{Error, Result};
use crate::registration::AttestationResult;
use crate::types::AuthenticatorTransport;

/// Lifecycle state of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "active"),
            CredentialStatus::Revoked => write!(f, "revoked"),
        }
    }
}

/// A registered credential as the storage layer keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique credential identifier chosen by the authenticator.
    pub credential_id: Vec<u8>,
    /// The subject this credential authenticates.
    pub subject_id: String,
    pub public_key: PublicKey,
    /// Highest signature counter accepted so far.
    pub counter: u32,
    pub status: CredentialStatus,
    pub usage_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked_reason: Option<String>,
    #[serde(default)]
    pub transports: Vec<AuthenticatorTransport>,
    pub aaguid: [u8; 16],
}

impl Credential {
    /// Builds a new active credential from a verified registration.
    pub fn from_attestation(subject_id: &str, attestation: AttestationResult) -> Self {
        Self::from_attestation_at(subject_id, attestation, Utc::now())
    }

    pub fn from_attestation_at(
        subject_id: &str,
        attestation: AttestationResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            credential_id: attestation.credential_id,
            subject_id: subject_id.to_string(),
            public_key: attestation.public_key,
            counter: attestation.counter,
            status: CredentialStatus::Active,
            usage_count: 0,
            last_used: None,
            created_at: now,
            revoked_reason: None,
            transports: attestation.transports,
            aaguid: attestation.aaguid,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }

    /// Moves an active credential to `revoked`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if it is already revoked.
    pub fn revoke(&mut self, reason: &str) -> Result<()> {
        self.transition(CredentialStatus::Active, "revoke")?;
        self.status = CredentialStatus::Revoked;
        self.revoked_reason = Some(reason.to_string());
        Ok(())
    }

    /// Moves a revoked credential back to `active`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if it is not revoked.
    pub fn reactivate(&mut self) -> Result<()> {
        self.transition(CredentialStatus::Revoked, "reactivate")?;
        self.status = CredentialStatus::Active;
        self.revoked_reason = None;
        Ok(())
    }

    /// Records a successful authentication.
    ///
    /// Bumps the usage count and last-used time. The counter only moves
    /// forward: `new_counter` is applied when it exceeds the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] for a revoked credential.
    pub fn record_use(&mut self, new_counter: Option<u32>) -> Result<()> {
        self.record_use_at(new_counter, Utc::now())
    }

    pub fn record_use_at(&mut self, new_counter: Option<u32>, now: DateTime<Utc>) -> Result<()> {
        self.transition(CredentialStatus::Active, "use")?;
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used = Some(now);
        if let Some(counter) = new_counter {
            if counter > self.counter {
                self.counter = counter;
            }
        }
        Ok(())
    }

    fn transition(&self, required: CredentialStatus, action: &'static str) -> Result<()> {
        if self.status != required {
            return Err(Error::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}

/// Persistence contract for credentials.
pub trait CredentialStore {
    /// Looks up a credential by its id.
    fn find_by_credential_id(&self, credential_id: &[u8]) -> Option<Credential>;

    /// Lists every credential registered to `subject_id`.
    fn list_for_subject(&self, subject_id: &str) -> Vec<Credential>;

    /// Stores a new active credential for a verified registration.
    fn create(&self, subject_id: &str, attestation: AttestationResult) -> Result<Credential>;

    /// Overwrites an existing credential (counter, usage, status updates).
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Revokes a credential by id.
    fn revoke(&self, credential_id: &[u8], reason: &str) -> Result<Credential> {
        let mut credential = self
            .find_by_credential_id(credential_id)
            .ok_or(Error::CredentialNotFound)?;
        credential.revoke(reason)?;
        self.save(&credential)?;
        Ok(credential)
    }

    /// Reactivates a revoked credential by id.
    fn reactivate(&self, credential_id: &[u8]) -> Result<Credential> {
        let mut credential = self
            .find_by_credential_id(credential_id)
            .ok_or(Error::CredentialNotFound)?;
        credential.reactivate()?;
        self.save(&credential)?;
        Ok(credential)
    }
}

/// A subject resolved from a login identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub credential_ids: Vec<Vec<u8>>,
}

/// Resolves a login-time identifier (e.g. an email) to a subject.
pub trait IdentityLookup {
    fn resolve(&self, identifier: &str) -> Option<Identity>;
}

impl IdentityLookup for HashMap<String, Identity> {
    fn resolve(&self, identifier: &str) -> Option<Identity> {
        self.get(identifier).cloned()
    }
}

/// In-memory [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: DashMap<Vec<u8>, Credential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_credential_id(&self, credential_id: &[u8]) -> Option<Credential> {
        self.credentials
            .get(credential_id)
            .map(|entry| entry.value().clone())
    }

    fn list_for_subject(&self, subject_id: &str) -> Vec<Credential> {
        self.credentials
            .iter()
            .filter(|entry| entry.subject_id == subject_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn create(&self, subject_id: &str, attestation: AttestationResult) -> Result<Credential> {
        match self.credentials.entry(attestation.credential_id.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateCredential),
            Entry::Vacant(slot) => {
                let credential = Credential::from_attestation(subject_id, attestation);
                slot.insert(credential.clone());
                info!(subject = %subject_id, "Stored new credential");
                Ok(credential)
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let mut entry = self
            .credentials
            .get_mut(credential.credential_id.as_slice())
            .ok_or(Error::CredentialNotFound)?;
        *entry = credential.clone();
        debug!(
            subject = %credential.subject_id,
            status = %credential.status,
            counter = credential.counter,
            "Saved credential"
        );
        Ok(())
    }
}
