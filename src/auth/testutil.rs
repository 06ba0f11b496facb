// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token minting helpers for tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

pub const TEST_SECRET: &str = "test-secret";

/// Base64url (unpadded) encoding of a JSON value.
pub fn encode_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

/// HMAC-SHA256 signature over `signing_input`, base64url encoded.
pub fn sign(signing_input: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("any key length");
    mac.update(signing_input.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Build a compact token from an arbitrary header and claims.
pub fn token_with_header(header: &Value, claims: &Value, secret: &str) -> String {
    let signing_input = format!("{}.{}", encode_json(header), encode_json(claims));
    let signature = sign(&signing_input, secret);
    format!("{signing_input}.{signature}")
}

/// Build an HS256 token.
pub fn hs256_token(claims: &Value, secret: &str) -> String {
    token_with_header(&json!({"alg": "HS256", "typ": "JWT"}), claims, secret)
}

/// Current Unix time in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
