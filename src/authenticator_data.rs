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

//! Fixed-layout authenticator data parsing.
//!
//! Layout (all integers big-endian):
//!
//! | Offset | Length | Field |
//! |---|---|---|
//! | 0 | 32 | RP ID hash |
//! | 32 | 1 | flags |
//! | 33 | 4 | signature counter |
//! | 37 | 16 | AAGUID (attested credential data only) |
//! | 53 | 2 | credential ID length `L` |
//! | 55 | L | credential ID |
//! | 55+L | var | COSE public key, then optional CBOR extensions |

use aws_lc_rs::digest::{self, SHA256};

use crate::cbor;
use crate::cose::PublicKey;
use crate::error::{Error, Result};

/// Length of the fixed prefix shared by registration and authentication.
pub const MIN_AUTH_DATA_LEN: usize = 37;

const RP_ID_HASH_LEN: usize = 32;
const AAGUID_LEN: usize = 16;

const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_USER_VERIFIED: u8 = 0x04;
const FLAG_BACKUP_ELIGIBLE: u8 = 0x08;
const FLAG_BACKUP_STATE: u8 = 0x10;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
const FLAG_EXTENSION_DATA: u8 = 0x80;

/// Decoded authenticator data flag byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthenticatorFlags {
    /// Bit 0: the user was present.
    pub user_present: bool,
    /// Bit 2: the user was verified (PIN, biometric).
    pub user_verified: bool,
    /// Bit 3: the credential may be backed up.
    pub backup_eligible: bool,
    /// Bit 4: the credential is currently backed up.
    pub backup_state: bool,
    /// Bit 6: attested credential data follows the counter.
    pub attested_credential_data: bool,
    /// Bit 7: extension data is included.
    pub extension_data: bool,
}

impl From<u8> for AuthenticatorFlags {
    fn from(byte: u8) -> Self {
        Self {
            user_present: byte & FLAG_USER_PRESENT != 0,
            user_verified: byte & FLAG_USER_VERIFIED != 0,
            backup_eligible: byte & FLAG_BACKUP_ELIGIBLE != 0,
            backup_state: byte & FLAG_BACKUP_STATE != 0,
            attested_credential_data: byte & FLAG_ATTESTED_CREDENTIAL_DATA != 0,
            extension_data: byte & FLAG_EXTENSION_DATA != 0,
        }
    }
}

/// The credential block present in registration authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; AAGUID_LEN],
    pub credential_id: Vec<u8>,
    pub public_key: PublicKey,
}

/// Parsed authenticator data.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; RP_ID_HASH_LEN],
    pub flags: AuthenticatorFlags,
    pub counter: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    pub extensions: Option<cbor::Value>,
}

impl AuthenticatorData {
    /// Parses an authenticator data block.
    ///
    /// The attested credential block and extensions are read only when their
    /// flag bits are set; any bytes left over after that are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBinary`] if the buffer is truncated, carries
    /// trailing bytes, or embeds an invalid COSE key or extension map.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_AUTH_DATA_LEN {
            return Err(Error::malformed(format!(
                "Authenticator data too short: {} bytes, need at least {}",
                bytes.len(),
                MIN_AUTH_DATA_LEN
            )));
        }

        let mut reader = ByteReader::new(bytes);
        let rp_id_hash = reader.read_array::<RP_ID_HASH_LEN>("RP ID hash")?;
        let flags = AuthenticatorFlags::from(reader.read_u8("flags")?);
        let counter = reader.read_u32_be("signature counter")?;

        let attested_credential_data = if flags.attested_credential_data {
            let aaguid = reader.read_array::<AAGUID_LEN>("AAGUID")?;
            let id_len = usize::from(reader.read_u16_be("credential ID length")?);
            let credential_id = reader.read_slice(id_len, "credential ID")?.to_vec();

            let key_bytes = reader.rest();
            let (key_value, consumed) = cbor::decode_first(key_bytes)?;
            let public_key = PublicKey::from_cose(&key_value, &key_bytes[..consumed])?;
            reader.skip(consumed, "COSE public key")?;

            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                public_key,
            })
        } else {
            None
        };

        let extensions = if flags.extension_data {
            let (value, consumed) = cbor::decode_first(reader.rest())?;
            reader.skip(consumed, "extensions")?;
            Some(value)
        } else {
            None
        };

        if !reader.is_empty() {
            return Err(Error::malformed(format!(
                "{} unexpected trailing bytes in authenticator data",
                reader.rest().len()
            )));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            counter,
            attested_credential_data,
            extensions,
        })
    }

    /// Whether the embedded RP ID hash equals SHA-256 of `rp_id`.
    pub fn matches_rp_id(&self, rp_id: &str) -> bool {
        rp_id_hash(rp_id) == self.rp_id_hash
    }
}

/// Computes SHA-256 of a relying party identifier.
pub fn rp_id_hash(rp_id: &str) -> [u8; RP_ID_HASH_LEN] {
    let mut out = [0u8; RP_ID_HASH_LEN];
    out.copy_from_slice(digest::digest(&SHA256, rp_id.as_bytes()).as_ref());
    out
}

/// Bounds-checked forward cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn read_slice(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                Error::malformed(format!(
                    "Truncated {}: need {} bytes at offset {}, have {}",
                    field,
                    len,
                    self.pos,
                    self.bytes.len() - self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N, field)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub(crate) fn read_u16_be(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array(field)?))
    }

    pub(crate) fn read_u32_be(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub(crate) fn skip(&mut self, len: usize, field: &str) -> Result<()> {
        self.read_slice(len, field).map(|_| ())
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
