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

//! Client data parsing and verification for WebAuthn ceremonies.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The type of WebAuthn ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Registration ceremony ("webauthn.create").
    Create,
    /// Authentication ceremony ("webauthn.get").
    Get,
}

impl ClientDataType {
    /// Returns the string representation used in the client data JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientDataType::Create => "webauthn.create",
            ClientDataType::Get => "webauthn.get",
        }
    }
}

impl FromStr for ClientDataType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "webauthn.create" => Ok(ClientDataType::Create),
            "webauthn.get" => Ok(ClientDataType::Get),
            _ => Err(Error::client_data(format!("Unknown type: {}", s))),
        }
    }
}

impl fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed client data from a WebAuthn response.
#[derive(Debug)]
pub struct ClientData {
    /// The ceremony type exactly as the client reported it.
    pub type_: String,

    /// The challenge that was signed (base64url-encoded).
    pub challenge: String,

    /// The origin of the requesting page.
    pub origin: String,

    /// Whether the request came from a cross-origin iframe.
    pub cross_origin: bool,
}

impl ClientData {
    /// Parses client data from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClientData`] if the bytes are not JSON or a
    /// required member (`type`, `challenge`, `origin`) is missing.
    pub fn from_bytes(bytes: &[u8]) -> Result<ClientData> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::client_data(format!("Invalid client data JSON: {}", e)))?;

        let type_ = json["type"]
            .as_str()
            .ok_or_else(|| Error::client_data("Missing type in client data"))?
            .to_string();

        let challenge = json["challenge"]
            .as_str()
            .ok_or_else(|| Error::client_data("Missing challenge in client data"))?
            .to_string();

        let origin = json["origin"]
            .as_str()
            .ok_or_else(|| Error::client_data("Missing origin in client data"))?
            .to_string();

        let cross_origin = json["crossOrigin"].as_bool().unwrap_or(false);

        Ok(ClientData {
            type_,
            challenge,
            origin,
            cross_origin,
        })
    }

    /// Returns the ceremony type, if it is one this engine knows.
    pub fn ceremony(&self) -> Option<ClientDataType> {
        self.type_.parse().ok()
    }

    #[allow(rustdoc::bare_urls)]
    /// Verifies the client data against expected values.
    ///
    /// Checks type, then challenge, then origin, reporting the first mismatch.
    ///
    /// # Arguments
    ///
    /// * `expected_type` - The expected ceremony type
    /// * `expected_challenge` - The raw bytes of the consumed challenge
    /// * `expected_origin` - The expected origin (e.g., "https://example.com")
    pub fn verify(
        &self,
        expected_type: ClientDataType,
        expected_challenge: &[u8],
        expected_origin: &str,
    ) -> Result<()> {
        if self.ceremony() != Some(expected_type) {
            return Err(Error::TypeMismatch {
                expected: expected_type.to_string(),
                actual: self.type_.clone(),
            });
        }

        // An undecodable challenge cannot equal the one we issued.
        let challenge =
            crate::base64_decode(&self.challenge).map_err(|_| Error::ChallengeMismatch)?;
        if challenge != expected_challenge {
            return Err(Error::ChallengeMismatch);
        }

        if self.origin != expected_origin {
            return Err(Error::OriginMismatch {
                expected: expected_origin.to_string(),
                actual: self.origin.clone(),
            });
        }

        Ok(())
    }
}
