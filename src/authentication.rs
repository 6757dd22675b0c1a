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

//! Authentication ceremony: assertion options and assertion verification.

use aws_lc_rs::digest::{self, SHA256};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::authenticator_data::{AuthenticatorData, AuthenticatorFlags};
use crate::challenge::Challenge;
use crate::client_data::{ClientData, ClientDataType};
use crate::cose::PublicKey;
use crate::credential::IdentityLookup;
use crate::error::{Error, Result};
use crate::types::*;
use crate::WebauthnEngine;

/// Options sent to the client to begin authentication.
///
/// Serializes to the JSON shape of `PublicKeyCredentialRequestOptions`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssertionOptions {
    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    /// The relying party identifier.
    pub rp_id: String,

    /// Credentials that may answer this challenge.
    pub allow_credentials: Vec<CredentialDescriptor>,

    pub user_verification: UserVerificationRequirement,
}

/// Credential data returned by the client after authentication.
#[derive(Deserialize, Debug, Clone)]
pub struct AssertionResponse {
    /// The credential ID that was used (base64url-encoded).
    pub id: String,

    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// The authenticator data (base64url-encoded).
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,

    /// Signature over `authenticatorData || SHA-256(clientDataJSON)` (base64url-encoded).
    pub signature: String,

    /// The user handle, returned by discoverable credentials.
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

/// Outcome of a verified assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionResult {
    /// The counter the authenticator reported; 0 if it keeps none.
    pub counter: u32,
    pub flags: AuthenticatorFlags,
}

impl AssertionResult {
    /// The counter value to persist, or `None` when the authenticator does not
    /// implement a counter and the stored value must stay as it is.
    pub fn new_counter(&self) -> Option<u32> {
        (self.counter != 0).then_some(self.counter)
    }
}

impl WebauthnEngine {
    /// Starts an authentication ceremony for `subject_id`.
    ///
    /// Issues a challenge keyed by the subject, replacing any pending one, and
    /// lists `allowed_credential_ids` with every accepted transport.
    pub fn begin_authentication(
        &self,
        subject_id: &str,
        allowed_credential_ids: &[Vec<u8>],
    ) -> AssertionOptions {
        let challenge = self.challenges.issue(subject_id);

        AssertionOptions {
            challenge: challenge.encoded(),
            timeout: self.config.timeout_ms,
            rp_id: self.config.rp_id.clone(),
            allow_credentials: allowed_credential_ids
                .iter()
                .map(|id| CredentialDescriptor::new(id, Some(AuthenticatorTransport::ALL.to_vec())))
                .collect(),
            user_verification: UserVerificationRequirement::Preferred,
        }
    }

    /// Resolves a login identifier through `lookup` and starts authentication
    /// for the subject it names.
    ///
    /// Returns the resolved subject id with the options, or `None` if the
    /// identifier is unknown (no challenge is issued in that case).
    pub fn begin_authentication_for<L: IdentityLookup + ?Sized>(
        &self,
        lookup: &L,
        identifier: &str,
    ) -> Option<(String, AssertionOptions)> {
        let identity = lookup.resolve(identifier)?;
        let options = self.begin_authentication(&identity.subject_id, &identity.credential_ids);
        Some((identity.subject_id, options))
    }

    /// Completes an authentication ceremony for `subject_id`.
    ///
    /// Verifies the assertion against the consumed challenge, the stored
    /// public key and the stored counter. Nothing is persisted; on success the
    /// caller records the use (and [`AssertionResult::new_counter`]) on the
    /// credential.
    ///
    /// # Errors
    ///
    /// * [`Error::ChallengeNotFound`] - no live challenge for the subject
    /// * [`Error::TypeMismatch`], [`Error::ChallengeMismatch`],
    ///   [`Error::OriginMismatch`] - client data does not match
    /// * [`Error::RpIdHashMismatch`], [`Error::UserNotPresent`]
    /// * [`Error::ReplayDetected`] - non-zero counter did not advance
    /// * [`Error::UnsupportedAlgorithm`], [`Error::SignatureInvalid`]
    /// * [`Error::MalformedBinary`], [`Error::InvalidEncoding`],
    ///   [`Error::MalformedClientData`] - undecodable input
    pub fn complete_authentication(
        &self,
        response: &AssertionResponse,
        subject_id: &str,
        stored_public_key: &PublicKey,
        stored_counter: u32,
    ) -> Result<AssertionResult> {
        let challenge = self
            .challenges
            .consume(subject_id)
            .ok_or(Error::ChallengeNotFound);

        let result = challenge.and_then(|challenge| {
            self.verify_assertion(response, &challenge, stored_public_key, stored_counter)
        });

        match &result {
            Ok(assertion) => info!(
                subject = %subject_id,
                counter = assertion.counter,
                user_verified = assertion.flags.user_verified,
                "Authentication verified"
            ),
            Err(e) => warn!(
                subject = %subject_id,
                kind = %e.kind(),
                reason = %e,
                "Authentication rejected"
            ),
        }

        result
    }

    fn verify_assertion(
        &self,
        response: &AssertionResponse,
        challenge: &Challenge,
        stored_public_key: &PublicKey,
        stored_counter: u32,
    ) -> Result<AssertionResult> {
        let client_data_bytes = crate::base64_decode(&response.client_data_json)?;
        let client_data = ClientData::from_bytes(&client_data_bytes)?;
        client_data.verify(ClientDataType::Get, &challenge.value, &self.config.origin)?;

        let auth_data_bytes = crate::base64_decode(&response.authenticator_data)?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;
        if auth_data.attested_credential_data.is_some() {
            return Err(Error::malformed(
                "Unexpected attested credential data in assertion",
            ));
        }

        if !auth_data.matches_rp_id(&self.config.rp_id) {
            return Err(Error::RpIdHashMismatch);
        }
        if !auth_data.flags.user_present {
            return Err(Error::UserNotPresent);
        }

        let counter = auth_data.counter;
        if counter != 0 {
            if counter <= stored_counter {
                return Err(Error::ReplayDetected {
                    stored: stored_counter,
                    received: counter,
                });
            }
        } else {
            warn!(
                subject = %challenge.subject_id,
                "Authenticator reports no signature counter, clone detection unavailable"
            );
        }

        // Signed over authenticatorData || SHA-256(clientDataJSON).
        let signature = crate::base64_decode(&response.signature)?;
        let client_data_hash = digest::digest(&SHA256, &client_data_bytes);
        let mut signed_data = auth_data_bytes;
        signed_data.extend_from_slice(client_data_hash.as_ref());

        stored_public_key.verify(&signed_data, &signature)?;

        Ok(AssertionResult {
            counter,
            flags: auth_data.flags,
        })
    }
}
