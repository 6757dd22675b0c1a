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

use aws_lc_rs::digest::{self, SHA256};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::rsa::KeySize;
use aws_lc_rs::signature::{
    EcdsaKeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING,
};
use ciborium::Value;

use crate::*;

pub const RP_ID: &str = "example.com";
pub const ORIGIN: &str = "https://example.com";

pub const FLAGS_UP: u8 = 0x01;
pub const FLAGS_UP_UV: u8 = 0x05;
pub const FLAGS_UP_UV_AT: u8 = 0x45;

pub fn test_engine() -> WebauthnEngine {
    WebauthnEngine::new(EngineConfig::new(RP_ID, ORIGIN, "Test Dispatch"))
}

pub fn test_subject() -> Subject {
    Subject::new("rider-0001", "rider@example.com", "Test Rider")
}

pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).unwrap();
    out
}

/// Builds a COSE map for an ES256 key.
pub fn create_es256_cose_key(x: &[u8], y: &[u8]) -> Vec<u8> {
    encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())), // kty: EC2
        (Value::Integer(3.into()), Value::Integer((-7).into())), // alg: ES256
        (Value::Integer((-1).into()), Value::Integer(1.into())), // crv: P-256
        (Value::Integer((-2).into()), Value::Bytes(x.to_vec())),
        (Value::Integer((-3).into()), Value::Bytes(y.to_vec())),
    ]))
}

/// Builds a COSE map for an RS256 key.
pub fn create_rs256_cose_key(n: &[u8], e: &[u8]) -> Vec<u8> {
    encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(3.into())), // kty: RSA
        (Value::Integer(3.into()), Value::Integer((-257).into())), // alg: RS256
        (Value::Integer((-1).into()), Value::Bytes(n.to_vec())),
        (Value::Integer((-2).into()), Value::Bytes(e.to_vec())),
    ]))
}

/// Builds a COSE map for an EdDSA key, which this engine stores but cannot verify.
pub fn create_eddsa_cose_key(x: &[u8]) -> Vec<u8> {
    encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(1.into())), // kty: OKP
        (Value::Integer(3.into()), Value::Integer((-8).into())), // alg: EdDSA
        (Value::Integer((-1).into()), Value::Integer(6.into())), // crv: Ed25519
        (Value::Integer((-2).into()), Value::Bytes(x.to_vec())),
    ]))
}

/// Authenticator data prefix: rpIdHash || flags || counter.
pub fn create_authenticator_data(rp_id: &str, flags: u8, counter: u32) -> Vec<u8> {
    let mut auth_data = Vec::new();
    auth_data.extend_from_slice(&rp_id_hash(rp_id));
    auth_data.push(flags);
    auth_data.extend_from_slice(&counter.to_be_bytes());
    auth_data
}

/// Registration authenticator data with an attested credential block.
pub fn create_attested_authenticator_data(
    rp_id: &str,
    flags: u8,
    counter: u32,
    aaguid: &[u8; 16],
    credential_id: &[u8],
    cose_key: &[u8],
) -> Vec<u8> {
    let mut auth_data = create_authenticator_data(rp_id, flags, counter);
    auth_data.extend_from_slice(aaguid);
    auth_data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
    auth_data.extend_from_slice(credential_id);
    auth_data.extend_from_slice(cose_key);
    auth_data
}

/// Wraps authenticator data in a "none" attestation object.
pub fn create_attestation_object(auth_data: Vec<u8>) -> Vec<u8> {
    encode(&Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Text("none".to_string())),
        (Value::Text("attStmt".to_string()), Value::Map(Vec::new())),
        (Value::Text("authData".to_string()), Value::Bytes(auth_data)),
    ]))
}

pub fn create_client_data_json(type_: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
    let client_data = serde_json::json!({
        "type": type_,
        "challenge": base64_encode(challenge),
        "origin": origin,
        "crossOrigin": false
    });
    serde_json::to_vec(&client_data).unwrap()
}

/// A software P-256 authenticator.
pub struct TestAuthenticator {
    pub key_pair: EcdsaKeyPair,
    pub credential_id: Vec<u8>,
    pub aaguid: [u8; 16],
    rng: SystemRandom,
}

impl TestAuthenticator {
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref()).unwrap();
        Self {
            key_pair,
            credential_id: vec![0xC1, 0xC2, 0xC3, 0xC4],
            aaguid: [0xAA; 16],
            rng,
        }
    }

    /// The uncompressed public point, `0x04 || x || y`.
    pub fn public_point(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::Es256 {
            point: self.public_point(),
        }
    }

    pub fn cose_key(&self) -> Vec<u8> {
        let point = self.public_point();
        create_es256_cose_key(&point[1..33], &point[33..65])
    }

    /// A registration response answering `options`.
    pub fn register(&self, options: &RegistrationOptions) -> RegistrationResponse {
        let challenge = base64_decode(&options.challenge).unwrap();
        let auth_data = create_attested_authenticator_data(
            RP_ID,
            FLAGS_UP_UV_AT,
            0,
            &self.aaguid,
            &self.credential_id,
            &self.cose_key(),
        );
        self.registration_response(
            &create_client_data_json("webauthn.create", &challenge, ORIGIN),
            &create_attestation_object(auth_data),
        )
    }

    pub fn registration_response(
        &self,
        client_data_json: &[u8],
        attestation_object: &[u8],
    ) -> RegistrationResponse {
        RegistrationResponse {
            id: base64_encode(&self.credential_id),
            client_data_json: base64_encode(client_data_json),
            attestation_object: base64_encode(attestation_object),
            transports: vec![AuthenticatorTransport::Internal],
        }
    }

    /// An assertion answering `options`, reporting `counter`.
    pub fn assert(&self, options: &AssertionOptions, counter: u32) -> AssertionResponse {
        let challenge = base64_decode(&options.challenge).unwrap();
        self.sign_assertion(
            &create_authenticator_data(RP_ID, FLAGS_UP_UV, counter),
            &create_client_data_json("webauthn.get", &challenge, ORIGIN),
        )
    }

    /// Signs `auth_data || SHA-256(client_data_json)` and packages the response.
    pub fn sign_assertion(&self, auth_data: &[u8], client_data_json: &[u8]) -> AssertionResponse {
        let mut signed_data = auth_data.to_vec();
        signed_data.extend_from_slice(digest::digest(&SHA256, client_data_json).as_ref());
        let signature = self.key_pair.sign(&self.rng, &signed_data).unwrap();

        AssertionResponse {
            id: base64_encode(&self.credential_id),
            client_data_json: base64_encode(client_data_json),
            authenticator_data: base64_encode(auth_data),
            signature: base64_encode(signature.as_ref()),
            user_handle: None,
        }
    }
}

/// Helper to create a test RSA key pair and return (key_pair, n, e)
pub fn create_test_rsa_keypair() -> (RsaKeyPair, Vec<u8>, Vec<u8>) {
    let key_pair = RsaKeyPair::generate(KeySize::Rsa2048).unwrap();
    let (n, e) = parse_rsa_public_key(key_pair.public_key().as_ref());
    (key_pair, n, e)
}

/// Parse DER `SEQUENCE { INTEGER n, INTEGER e }` into unsigned big-endian n and e.
fn parse_rsa_public_key(der: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut pos = 0;

    assert_eq!(der[pos], 0x30);
    pos += 1;
    let (_, len_bytes) = read_der_length(&der[pos..]);
    pos += len_bytes;

    let read_integer = |pos: &mut usize| {
        assert_eq!(der[*pos], 0x02);
        *pos += 1;
        let (len, len_bytes) = read_der_length(&der[*pos..]);
        *pos += len_bytes;
        let mut value = der[*pos..*pos + len].to_vec();
        *pos += len;
        // Leading zero is a DER sign byte
        if value.first() == Some(&0x00) {
            value.remove(0);
        }
        value
    };

    let n = read_integer(&mut pos);
    let e = read_integer(&mut pos);
    (n, e)
}

/// Read DER length encoding, returns (length, bytes_consumed)
fn read_der_length(data: &[u8]) -> (usize, usize) {
    if data[0] < 0x80 {
        (data[0] as usize, 1)
    } else {
        let num_bytes = (data[0] & 0x7F) as usize;
        let mut len = 0usize;
        for i in 0..num_bytes {
            len = (len << 8) | (data[1 + i] as usize);
        }
        (len, 1 + num_bytes)
    }
}
