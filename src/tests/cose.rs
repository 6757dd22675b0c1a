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

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::RSA_PKCS1_SHA256;
use ciborium::Value;

use super::helpers::*;
use crate::cbor::decode_exact;
use crate::*;

fn public_key_from(cose_key: &[u8]) -> Result<PublicKey> {
    let value = decode_exact(cose_key)?;
    PublicKey::from_cose(&value, cose_key)
}

// ===== COSE key extraction =====

#[test]
fn test_from_cose_es256_point() {
    let key = public_key_from(&create_es256_cose_key(&[5u8; 32], &[6u8; 32])).unwrap();

    assert_eq!(key.algorithm(), COSE_ALG_ES256);
    assert!(key.is_supported());
    let PublicKey::Es256 { point } = key else {
        panic!("expected ES256 key");
    };
    let mut expected = vec![0x04];
    expected.extend_from_slice(&[5u8; 32]);
    expected.extend_from_slice(&[6u8; 32]);
    assert_eq!(point, expected);
}

#[test]
fn test_from_cose_es256_short_coordinate() {
    let err = public_key_from(&create_es256_cose_key(&[5u8; 31], &[6u8; 32])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedBinary);
    assert!(err.to_string().contains("x coordinate"));
}

#[test]
fn test_from_cose_es256_missing_y() {
    let cose_key = encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())),
        (Value::Integer(3.into()), Value::Integer((-7).into())),
        (Value::Integer((-1).into()), Value::Integer(1.into())),
        (Value::Integer((-2).into()), Value::Bytes(vec![1u8; 32])),
    ]));

    let err = public_key_from(&cose_key).unwrap_err();
    assert!(err.to_string().contains("Missing y"));
}

#[test]
fn test_from_cose_es256_wrong_curve() {
    let cose_key = encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())),
        (Value::Integer(3.into()), Value::Integer((-7).into())),
        (Value::Integer((-1).into()), Value::Integer(2.into())), // P-384
        (Value::Integer((-2).into()), Value::Bytes(vec![1u8; 32])),
        (Value::Integer((-3).into()), Value::Bytes(vec![1u8; 32])),
    ]));

    let err = public_key_from(&cose_key).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedBinary);
}

#[test]
fn test_from_cose_missing_algorithm() {
    let cose_key = encode(&Value::Map(vec![(
        Value::Integer(1.into()),
        Value::Integer(2.into()),
    )]));

    let err = public_key_from(&cose_key).unwrap_err();
    assert!(err.to_string().contains("algorithm"));
}

#[test]
fn test_from_cose_not_a_map() {
    let cose_key = encode(&Value::Bytes(vec![1, 2, 3]));
    assert_eq!(
        public_key_from(&cose_key).unwrap_err().kind(),
        ErrorKind::MalformedBinary
    );
}

#[test]
fn test_from_cose_eddsa_is_kept_but_unsupported() {
    let cose_key = create_eddsa_cose_key(&[4u8; 32]);
    let key = public_key_from(&cose_key).unwrap();

    assert_eq!(
        key,
        PublicKey::Unsupported {
            algorithm: -8,
            cose_key: cose_key.clone(),
        }
    );
    assert!(!key.is_supported());

    let err = key.verify(b"message", &[0u8; 64]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedAlgorithm(-8)));
}

#[test]
fn test_public_key_serde_tagged() {
    let key = PublicKey::Rs256 {
        n: vec![1, 2],
        e: vec![1, 0, 1],
    };
    let json = serde_json::to_value(&key).unwrap();
    assert_eq!(json["alg"], "rs256");

    let back: PublicKey = serde_json::from_value(json).unwrap();
    assert_eq!(back, key);
}

// ===== ES256 verification =====

#[test]
fn test_verify_es256_valid_signature() {
    let authenticator = TestAuthenticator::new();
    let key = public_key_from(&authenticator.cose_key()).unwrap();
    assert_eq!(key, authenticator.public_key());

    let response = authenticator.sign_assertion(b"auth data", b"{}");
    let signature = base64_decode(&response.signature).unwrap();
    let mut signed = b"auth data".to_vec();
    signed.extend_from_slice(
        aws_lc_rs::digest::digest(&aws_lc_rs::digest::SHA256, b"{}").as_ref(),
    );

    assert!(key.verify(&signed, &signature).is_ok());
}

#[test]
fn test_verify_es256_wrong_message() {
    let authenticator = TestAuthenticator::new();
    let response = authenticator.sign_assertion(b"auth data", b"{}");
    let signature = base64_decode(&response.signature).unwrap();

    let err = authenticator
        .public_key()
        .verify(b"different message", &signature)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn test_verify_es256_other_key() {
    let signer = TestAuthenticator::new();
    let other = TestAuthenticator::new();
    let response = signer.sign_assertion(b"auth data", b"{}");
    let signature = base64_decode(&response.signature).unwrap();

    let mut signed = b"auth data".to_vec();
    signed.extend_from_slice(
        aws_lc_rs::digest::digest(&aws_lc_rs::digest::SHA256, b"{}").as_ref(),
    );
    let err = other.public_key().verify(&signed, &signature).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn test_verify_es256_invalid_point() {
    let key = PublicKey::Es256 {
        point: vec![0x04; 65],
    };
    let err = key.verify(b"message", &[0x30, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

// ===== RS256 verification =====

#[test]
fn test_verify_rs256_valid_signature() {
    let rng = SystemRandom::new();
    let (key_pair, n, e) = create_test_rsa_keypair();
    let message = b"test message for RS256";

    let mut signature = vec![0u8; key_pair.public_modulus_len()];
    key_pair
        .sign(&RSA_PKCS1_SHA256, &rng, message, &mut signature)
        .unwrap();

    let key = public_key_from(&create_rs256_cose_key(&n, &e)).unwrap();
    assert_eq!(key.algorithm(), COSE_ALG_RS256);

    let result = key.verify(message, &signature);
    assert!(
        result.is_ok(),
        "Valid RS256 signature should verify successfully: {:?}",
        result.err()
    );
}

#[test]
fn test_verify_rs256_invalid_signature() {
    let rng = SystemRandom::new();
    let (key_pair, n, e) = create_test_rsa_keypair();

    let mut signature = vec![0u8; key_pair.public_modulus_len()];
    key_pair
        .sign(&RSA_PKCS1_SHA256, &rng, b"test message", &mut signature)
        .unwrap();

    let key = PublicKey::Rs256 { n, e };
    let err = key.verify(b"different message", &signature).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn test_from_cose_rs256_missing_modulus() {
    let cose_key = encode(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(3.into())),
        (Value::Integer(3.into()), Value::Integer((-257).into())),
        (Value::Integer((-2).into()), Value::Bytes(vec![1, 0, 1])),
    ]));

    let err = public_key_from(&cose_key).unwrap_err();
    assert!(err.to_string().contains("Missing n (modulus)"));
}
