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

//! Generic CBOR decoding into a value tree.
//!
//! Authenticators encode the attestation object, the credential public key and
//! extension outputs as CBOR. Decoding works on a byte slice so callers learn
//! how many bytes the first item occupied, which is what locates the extension
//! block that may follow a COSE key inside authenticator data.

pub use ciborium::Value;

use crate::error::{Error, Result};

/// Decodes the first CBOR item in `bytes`.
///
/// Returns the decoded value and the number of bytes it occupied. Trailing
/// bytes are left untouched for the caller to interpret.
///
/// # Errors
///
/// Returns [`Error::MalformedBinary`] on truncated or invalid input.
pub fn decode_first(bytes: &[u8]) -> Result<(Value, usize)> {
    let mut remaining = bytes;
    let value: Value = ciborium::from_reader(&mut remaining)
        .map_err(|e| Error::malformed(format!("Invalid CBOR: {}", e)))?;
    let consumed = bytes.len() - remaining.len();
    Ok((value, consumed))
}

/// Decodes `bytes` as exactly one CBOR item.
///
/// # Errors
///
/// Returns [`Error::MalformedBinary`] on invalid input or trailing bytes.
pub fn decode_exact(bytes: &[u8]) -> Result<Value> {
    let (value, consumed) = decode_first(bytes)?;
    if consumed != bytes.len() {
        return Err(Error::malformed(format!(
            "{} trailing bytes after CBOR item",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// Borrows the entries of a CBOR map.
pub fn as_map(value: &Value) -> Result<&[(Value, Value)]> {
    value
        .as_map()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::malformed("Expected CBOR map"))
}

/// Looks up a text-keyed entry in a CBOR map.
pub fn get_text_key<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

/// Looks up an integer-keyed entry in a CBOR map (COSE labels).
pub fn get_int_key(map: &[(Value, Value)], key: i64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| as_i64(k) == Some(key))
        .map(|(_, v)| v)
}

/// Reads a CBOR integer that fits in an `i64`.
pub fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_integer()
        .and_then(|i| i64::try_from(i128::from(i)).ok())
}
