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

//! Wire types shared by registration and authentication ceremonies.

use serde::{Deserialize, Serialize};

/// Credential type carried in every descriptor.
pub const PUBLIC_KEY_TYPE: &str = "public-key";

/// Attestation conveyance preference for registration.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// No attestation information is requested.
    None,
    /// Attestation information may be provided if available.
    Indirect,
    /// Direct attestation from the authenticator is requested.
    Direct,
}

/// Resident key requirement for registration.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    Discouraged,
    Preferred,
    Required,
}

/// User verification requirement for both ceremonies.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    /// User verification is required.
    Required,
    /// User verification is preferred but not required.
    Preferred,
    /// User verification should not be performed.
    Discouraged,
}

/// Which class of authenticator the relying party asks for.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    /// Built into the client device (Touch ID, Windows Hello).
    Platform,
    /// Roaming authenticator (security key, phone).
    CrossPlatform,
}

/// Authenticator transport hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorTransport {
    Usb,
    Nfc,
    Ble,
    Internal,
    Hybrid,
}

impl AuthenticatorTransport {
    /// Every transport an assertion may arrive over.
    pub const ALL: [AuthenticatorTransport; 5] = [
        AuthenticatorTransport::Internal,
        AuthenticatorTransport::Hybrid,
        AuthenticatorTransport::Usb,
        AuthenticatorTransport::Nfc,
        AuthenticatorTransport::Ble,
    ];
}

/// The account a credential is registered for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    /// Opaque, stable identifier; also the challenge store key.
    pub id: String,

    /// Username or account identifier (e.g. an email address).
    pub name: String,

    /// Human-readable display name.
    pub display_name: String,
}

impl Subject {
    pub fn new(id: &str, name: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Information about the relying party (RP).
#[derive(Serialize, Debug)]
pub struct RelyingParty {
    /// Human-readable name of the relying party.
    pub name: String,

    /// Unique identifier for the relying party (typically the domain).
    pub id: String,
}

/// Information about the user account.
#[derive(Clone, Serialize, Debug)]
pub struct UserInfo {
    /// Unique identifier for the user account (base64url-encoded).
    pub id: String,

    /// Username or account identifier.
    pub name: String,

    /// Human-readable display name for the user.
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// A public key credential parameter specifying an acceptable algorithm.
#[derive(Serialize, Debug)]
pub struct PubKeyCredParam {
    /// COSE algorithm identifier (e.g., -7 for ES256).
    pub alg: i64,

    /// Credential type (always "public-key").
    #[serde(rename = "type")]
    pub type_: String,
}

impl PubKeyCredParam {
    pub(crate) fn public_key(alg: i64) -> Self {
        Self {
            alg,
            type_: PUBLIC_KEY_TYPE.to_string(),
        }
    }
}

/// Authenticator selection criteria for registration.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    pub resident_key: ResidentKeyRequirement,

    pub user_verification: UserVerificationRequirement,
}

/// A credential reference used in `excludeCredentials` and `allowCredentials`.
#[derive(Serialize, Debug)]
pub struct CredentialDescriptor {
    /// The credential ID (base64url-encoded).
    pub id: String,

    /// Credential type (always "public-key").
    #[serde(rename = "type")]
    pub type_: String,

    /// Transports the client may try; omitted when unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

impl CredentialDescriptor {
    pub(crate) fn new(
        credential_id: &[u8],
        transports: Option<Vec<AuthenticatorTransport>>,
    ) -> Self {
        Self {
            id: crate::base64_encode(credential_id),
            type_: PUBLIC_KEY_TYPE.to_string(),
            transports,
        }
    }
}
