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

//! COSE public keys and assertion signature verification.

use aws_lc_rs::signature::{
    RsaPublicKeyComponents, UnparsedPublicKey, ECDSA_P256_SHA256_ASN1,
    RSA_PKCS1_2048_8192_SHA256,
};
use serde::{Deserialize, Serialize};

use crate::cbor::{self, Value};
use crate::error::{Error, Result};

/// COSE algorithm identifier for ECDSA P-256 with SHA-256.
pub const COSE_ALG_ES256: i64 = -7;

/// COSE algorithm identifier for RSASSA-PKCS1-v1_5 with SHA-256.
pub const COSE_ALG_RS256: i64 = -257;

// COSE key map labels (RFC 9053).
const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV_OR_N: i64 = -1;
const LABEL_X_OR_E: i64 = -2;
const LABEL_Y: i64 = -3;

const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;
const CRV_P256: i64 = 1;

/// Marker byte of an uncompressed SEC1 elliptic curve point.
pub const UNCOMPRESSED_POINT: u8 = 0x04;

const P256_COORDINATE_LEN: usize = 32;

/// A credential public key, tagged by algorithm.
///
/// This is the durable form stored alongside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "alg", rename_all = "lowercase")]
pub enum PublicKey {
    /// P-256 key as an uncompressed point: `0x04 || x || y` (65 bytes).
    Es256 { point: Vec<u8> },

    /// RSA key as big-endian modulus and exponent.
    Rs256 { n: Vec<u8>, e: Vec<u8> },

    /// Any other algorithm; kept verbatim but never verified against.
    Unsupported { algorithm: i64, cose_key: Vec<u8> },
}

impl PublicKey {
    /// Builds a public key from a decoded COSE key map.
    ///
    /// `raw` must be the encoded bytes `value` was decoded from; it is kept
    /// for algorithms this engine cannot verify.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBinary`] if the map lacks an algorithm or
    /// the key material for ES256/RS256 is missing or malformed.
    pub fn from_cose(value: &Value, raw: &[u8]) -> Result<Self> {
        let map = cbor::as_map(value)?;

        let algorithm = cbor::get_int_key(map, LABEL_ALG)
            .and_then(cbor::as_i64)
            .ok_or_else(|| Error::malformed("Missing or invalid algorithm in COSE key"))?;
        let kty = cbor::get_int_key(map, LABEL_KTY).and_then(cbor::as_i64);

        match algorithm {
            COSE_ALG_ES256 => {
                if kty.is_some_and(|k| k != KTY_EC2) {
                    return Err(Error::malformed("ES256 key must have EC2 key type"));
                }
                if let Some(crv) = cbor::get_int_key(map, LABEL_CRV_OR_N) {
                    if cbor::as_i64(crv) != Some(CRV_P256) {
                        return Err(Error::malformed("ES256 key must use the P-256 curve"));
                    }
                }

                let x = coordinate(map, LABEL_X_OR_E, "x")?;
                let y = coordinate(map, LABEL_Y, "y")?;

                let mut point = Vec::with_capacity(1 + 2 * P256_COORDINATE_LEN);
                point.push(UNCOMPRESSED_POINT);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                Ok(PublicKey::Es256 { point })
            }
            COSE_ALG_RS256 => {
                if kty.is_some_and(|k| k != KTY_RSA) {
                    return Err(Error::malformed("RS256 key must have RSA key type"));
                }

                let n = byte_field(map, LABEL_CRV_OR_N, "n (modulus)")?;
                let e = byte_field(map, LABEL_X_OR_E, "e (exponent)")?;
                Ok(PublicKey::Rs256 {
                    n: n.to_vec(),
                    e: e.to_vec(),
                })
            }
            other => Ok(PublicKey::Unsupported {
                algorithm: other,
                cose_key: raw.to_vec(),
            }),
        }
    }

    /// The COSE algorithm identifier of this key.
    pub fn algorithm(&self) -> i64 {
        match self {
            PublicKey::Es256 { .. } => COSE_ALG_ES256,
            PublicKey::Rs256 { .. } => COSE_ALG_RS256,
            PublicKey::Unsupported { algorithm, .. } => *algorithm,
        }
    }

    /// Whether signatures can be verified against this key.
    pub fn is_supported(&self) -> bool {
        !matches!(self, PublicKey::Unsupported { .. })
    }

    /// Verifies `signature` over `signed_data` with this key.
    ///
    /// ES256 signatures are ASN.1 DER encoded, as WebAuthn authenticators
    /// produce them. Both algorithms hash `signed_data` with SHA-256 internally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] for keys of other algorithms and
    /// [`Error::SignatureInvalid`] if verification fails.
    pub fn verify(&self, signed_data: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            PublicKey::Es256 { point } => {
                UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, point)
                    .verify(signed_data, signature)
                    .map_err(|_| Error::SignatureInvalid)
            }
            PublicKey::Rs256 { n, e } => {
                let components = RsaPublicKeyComponents {
                    n: n.as_slice(),
                    e: e.as_slice(),
                };
                components
                    .verify(&RSA_PKCS1_2048_8192_SHA256, signed_data, signature)
                    .map_err(|_| Error::SignatureInvalid)
            }
            PublicKey::Unsupported { algorithm, .. } => {
                Err(Error::UnsupportedAlgorithm(*algorithm))
            }
        }
    }
}

fn byte_field<'a>(map: &'a [(Value, Value)], label: i64, name: &str) -> Result<&'a [u8]> {
    cbor::get_int_key(map, label)
        .and_then(Value::as_bytes)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::malformed(format!("Missing {} in COSE key", name)))
}

fn coordinate<'a>(map: &'a [(Value, Value)], label: i64, name: &str) -> Result<&'a [u8]> {
    let bytes = byte_field(map, label, name)?;
    if bytes.len() != P256_COORDINATE_LEN {
        return Err(Error::malformed(format!(
            "Invalid {} coordinate length: {}",
            name,
            bytes.len()
        )));
    }
    Ok(bytes)
}
