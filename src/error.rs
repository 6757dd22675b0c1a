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

//! Error types for WebAuthn ceremonies and credential lifecycle operations.

use std::fmt;

use thiserror::Error;

use crate::credential::CredentialStatus;

/// Error type for every fallible engine operation.
///
/// A failed verification never leaves partial state behind: the challenge
/// that was consumed stays consumed, and no credential is touched.
#[derive(Debug, Error)]
pub enum Error {
    /// No challenge is stored for the subject, or it has expired.
    #[error("No pending challenge for this subject (absent or expired)")]
    ChallengeNotFound,

    /// Client data `type` is not the expected ceremony type.
    #[error("Invalid type: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Client data challenge does not equal the stored challenge.
    #[error("Challenge mismatch")]
    ChallengeMismatch,

    /// Client data origin does not equal the expected origin.
    #[error("Invalid origin: expected {expected}, got {actual}")]
    OriginMismatch { expected: String, actual: String },

    /// The RP ID hash embedded in authenticator data is not SHA-256 of the RP ID.
    #[error("RP ID hash mismatch")]
    RpIdHashMismatch,

    /// The UserPresent flag is not set.
    #[error("User presence flag not set")]
    UserNotPresent,

    /// A registration response carries no attested credential data.
    #[error("No attested credential data present")]
    MissingAttestedData,

    /// Truncated or invalid binary input at any decoding layer.
    #[error("Malformed binary data: {0}")]
    MalformedBinary(String),

    /// A non-zero signature counter did not advance past the stored value.
    #[error("Invalid counter {received} (stored {stored}), possible replay attack")]
    ReplayDetected { stored: u32, received: u32 },

    /// The COSE algorithm is not ES256 or RS256.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(i64),

    /// A base64url field could not be decoded.
    #[error("Base64 decode error: {0}")]
    InvalidEncoding(String),

    /// Client data is not valid JSON or lacks a required member.
    #[error("Invalid client data: {0}")]
    MalformedClientData(String),

    /// The assertion signature does not verify under the stored public key.
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// A lifecycle action is not allowed from the credential's current status.
    #[error("Cannot {action} a credential that is {from}")]
    InvalidTransition {
        from: CredentialStatus,
        action: &'static str,
    },

    /// The storage collaborator holds no credential with this id.
    #[error("Credential not found")]
    CredentialNotFound,

    /// The storage collaborator already holds a credential with this id.
    #[error("Credential already registered")]
    DuplicateCredential,
}

/// Fieldless discriminant of [`Error`], for mapping failures to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ChallengeNotFound,
    TypeMismatch,
    ChallengeMismatch,
    OriginMismatch,
    RpIdHashMismatch,
    UserNotPresent,
    MissingAttestedData,
    MalformedBinary,
    ReplayDetected,
    UnsupportedAlgorithm,
    InvalidEncoding,
    MalformedClientData,
    SignatureInvalid,
    InvalidTransition,
    CredentialNotFound,
    DuplicateCredential,
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBinary(msg.into())
    }

    pub(crate) fn client_data(msg: impl Into<String>) -> Self {
        Self::MalformedClientData(msg.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ChallengeNotFound => ErrorKind::ChallengeNotFound,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::ChallengeMismatch => ErrorKind::ChallengeMismatch,
            Error::OriginMismatch { .. } => ErrorKind::OriginMismatch,
            Error::RpIdHashMismatch => ErrorKind::RpIdHashMismatch,
            Error::UserNotPresent => ErrorKind::UserNotPresent,
            Error::MissingAttestedData => ErrorKind::MissingAttestedData,
            Error::MalformedBinary(_) => ErrorKind::MalformedBinary,
            Error::ReplayDetected { .. } => ErrorKind::ReplayDetected,
            Error::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Error::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            Error::MalformedClientData(_) => ErrorKind::MalformedClientData,
            Error::SignatureInvalid => ErrorKind::SignatureInvalid,
            Error::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Error::CredentialNotFound => ErrorKind::CredentialNotFound,
            Error::DuplicateCredential => ErrorKind::DuplicateCredential,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, Error>;
