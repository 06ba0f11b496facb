// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact token codec.
//!
//! A compact token is `header.payload.signature`, each segment base64url
//! without padding. Only the signature is decoded here: the signature is
//! computed over the *encoded* header and payload, so those two are handed
//! on untouched.

use base64ct::{Base64UrlUnpadded, Encoding};

use super::error::TokenError;

/// A compact token split into its three segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts<'a> {
    /// Encoded header segment.
    pub header: &'a str,
    /// Encoded payload (claims) segment.
    pub payload: &'a str,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// Split a compact token into header, payload and decoded signature.
///
/// Fails with [`TokenError::Format`] unless there are exactly three
/// `.`-separated segments and the last one is valid unpadded base64url.
pub fn split(token: &str) -> Result<TokenParts<'_>, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Format);
    };

    let signature = decode_segment(signature).ok_or(TokenError::Format)?;

    Ok(TokenParts {
        header,
        payload,
        signature,
    })
}

/// Decode one unpadded base64url segment.
pub fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(segment).ok()
}
