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

//! Registration ceremony: creation options and attestation verification.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::authenticator_data::{AuthenticatorData, AuthenticatorFlags};
use crate::cbor;
use crate::challenge::Challenge;
use crate::client_data::{ClientData, ClientDataType};
use crate::cose::{PublicKey, COSE_ALG_ES256, COSE_ALG_RS256};
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::types::*;
use crate::WebauthnEngine;

/// Options sent to the client to begin registration.
///
/// Serializes to the JSON shape of `PublicKeyCredentialCreationOptions`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    /// Information about the relying party.
    pub rp: RelyingParty,

    /// Information about the user.
    pub user: UserInfo,

    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// Acceptable algorithms, most preferred first.
    pub pub_key_cred_params: Vec<PubKeyCredParam>,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    pub attestation: AttestationConveyancePreference,

    pub authenticator_selection: AuthenticatorSelection,

    /// Credentials the subject already holds, so the authenticator does not
    /// register a second one.
    pub exclude_credentials: Vec<CredentialDescriptor>,
}

/// Credential data returned by the client after registration.
#[derive(Deserialize, Debug, Clone)]
pub struct RegistrationResponse {
    /// The credential ID (base64url-encoded).
    pub id: String,

    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// The CBOR attestation object (base64url-encoded).
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,

    /// Transports reported by the client, if any.
    #[serde(default)]
    pub transports: Vec<AuthenticatorTransport>,
}

/// Outcome of a verified registration, ready to be stored as a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    pub credential_id: Vec<u8>,
    pub public_key: PublicKey,
    /// Initial signature counter.
    pub counter: u32,
    pub aaguid: [u8; 16],
    pub flags: AuthenticatorFlags,
    /// Attestation statement format (e.g. "none", "packed"). Not validated.
    pub format: String,
    pub transports: Vec<AuthenticatorTransport>,
}

/// The decoded outer attestation object.
struct AttestationObject {
    format: String,
    auth_data: Vec<u8>,
}

impl AttestationObject {
    fn parse(bytes: &[u8]) -> Result<Self> {
        let value = cbor::decode_exact(bytes)?;
        let map = cbor::as_map(&value)?;

        let format = cbor::get_text_key(map, "fmt")
            .and_then(cbor::Value::as_text)
            .ok_or_else(|| Error::malformed("Missing fmt in attestation object"))?
            .to_string();

        if let Some(statement) = cbor::get_text_key(map, "attStmt") {
            if statement.as_map().is_none() {
                return Err(Error::malformed("attStmt is not a map"));
            }
        }

        let auth_data = cbor::get_text_key(map, "authData")
            .and_then(cbor::Value::as_bytes)
            .ok_or_else(|| Error::malformed("Missing authData in attestation object"))?
            .clone();

        Ok(Self { format, auth_data })
    }
}

impl WebauthnEngine {
    /// Starts a registration ceremony for `subject`.
    ///
    /// Issues a challenge keyed by the subject's id, replacing any pending one.
    /// `existing` lists credentials the subject already holds; they are sent
    /// as `excludeCredentials`.
    pub fn begin_registration(
        &self,
        subject: &Subject,
        existing: &[Credential],
    ) -> RegistrationOptions {
        let challenge = self.challenges.issue(&subject.id);

        let exclude_credentials = existing
            .iter()
            .map(|credential| {
                let transports = (!credential.transports.is_empty())
                    .then(|| credential.transports.clone());
                CredentialDescriptor::new(&credential.credential_id, transports)
            })
            .collect();

        RegistrationOptions {
            rp: RelyingParty {
                name: self.config.rp_name.clone(),
                id: self.config.rp_id.clone(),
            },
            user: UserInfo {
                id: crate::base64_encode(subject.id.as_bytes()),
                name: subject.name.clone(),
                display_name: subject.display_name.clone(),
            },
            challenge: challenge.encoded(),
            pub_key_cred_params: vec![
                PubKeyCredParam::public_key(COSE_ALG_ES256),
                PubKeyCredParam::public_key(COSE_ALG_RS256),
            ],
            timeout: self.config.timeout_ms,
            attestation: AttestationConveyancePreference::None,
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: Some(AuthenticatorAttachment::Platform),
                resident_key: ResidentKeyRequirement::Preferred,
                user_verification: UserVerificationRequirement::Preferred,
            },
            exclude_credentials,
        }
    }

    /// Completes a registration ceremony for `subject_id`.
    ///
    /// Consumes the subject's pending challenge before anything else, so a
    /// failed attempt cannot be retried against it. Nothing is persisted; the
    /// caller stores the returned result as a new credential.
    ///
    /// # Errors
    ///
    /// * [`Error::ChallengeNotFound`] - no live challenge for the subject
    /// * [`Error::TypeMismatch`], [`Error::ChallengeMismatch`],
    ///   [`Error::OriginMismatch`] - client data does not match
    /// * [`Error::RpIdHashMismatch`] - credential scoped to another RP
    /// * [`Error::UserNotPresent`], [`Error::MissingAttestedData`] - flag checks
    /// * [`Error::MalformedBinary`], [`Error::InvalidEncoding`],
    ///   [`Error::MalformedClientData`] - undecodable input
    pub fn complete_registration(
        &self,
        response: &RegistrationResponse,
        subject_id: &str,
    ) -> Result<AttestationResult> {
        let challenge = self
            .challenges
            .consume(subject_id)
            .ok_or(Error::ChallengeNotFound);

        let result = challenge.and_then(|challenge| self.verify_registration(response, &challenge));

        match &result {
            Ok(attestation) => info!(
                subject = %subject_id,
                format = %attestation.format,
                algorithm = attestation.public_key.algorithm(),
                counter = attestation.counter,
                "Registration verified"
            ),
            Err(e) => warn!(
                subject = %subject_id,
                kind = %e.kind(),
                reason = %e,
                "Registration rejected"
            ),
        }

        result
    }

    fn verify_registration(
        &self,
        response: &RegistrationResponse,
        challenge: &Challenge,
    ) -> Result<AttestationResult> {
        let client_data_bytes = crate::base64_decode(&response.client_data_json)?;
        let client_data = ClientData::from_bytes(&client_data_bytes)?;
        client_data.verify(ClientDataType::Create, &challenge.value, &self.config.origin)?;

        let attestation_bytes = crate::base64_decode(&response.attestation_object)?;
        let attestation = AttestationObject::parse(&attestation_bytes)?;
        let auth_data = AuthenticatorData::parse(&attestation.auth_data)?;

        if !auth_data.matches_rp_id(&self.config.rp_id) {
            return Err(Error::RpIdHashMismatch);
        }
        if !auth_data.flags.user_present {
            return Err(Error::UserNotPresent);
        }
        let attested = auth_data
            .attested_credential_data
            .ok_or(Error::MissingAttestedData)?;

        let response_id = crate::base64_decode(&response.id)?;
        if response_id != attested.credential_id {
            return Err(Error::malformed(
                "Credential ID does not match authenticator data",
            ));
        }

        Ok(AttestationResult {
            credential_id: attested.credential_id,
            public_key: attested.public_key,
            counter: auth_data.counter,
            aaguid: attested.aaguid,
            flags: auth_data.flags,
            format: attestation.format,
            transports: response.transports.clone(),
        })
    }
}
