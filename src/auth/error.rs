// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification errors.
//!
//! Every variant collapses into the same rejection on the wire. The variants
//! exist so that each failing stage can be told apart in the logs.

use thiserror::Error;

/// Which base64url segment of a compact token failed to decode or parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Claims,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Header => write!(f, "header"),
            Segment::Claims => write!(f, "claims"),
        }
    }
}

/// Which temporal claim rejected the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeViolation {
    /// `nbf` is still more than the skew tolerance in the future.
    NotYetValid,
    /// `exp` passed more than the skew tolerance ago.
    Expired,
}

impl std::fmt::Display for TimeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeViolation::NotYetValid => write!(f, "not yet valid"),
            TimeViolation::Expired => write!(f, "expired"),
        }
    }
}

/// Reasons a token can fail verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not exactly three segments, or the signature segment is not base64url.
    #[error("token format invalid")]
    Format,

    /// A header or claims segment is not base64url-encoded JSON of the right shape.
    #[error("token {0} could not be decoded")]
    Decode(Segment),

    /// The header names an algorithm other than the one accepted.
    #[error("unsupported algorithm {actual:?} (expected {expected:?})")]
    UnsupportedAlgorithm { actual: String, expected: String },

    /// HMAC-SHA256 over `header.payload` does not match the signature segment.
    #[error("token signature verification failed")]
    Signature,

    /// The `nbf` or `exp` claim rejected the token.
    #[error("token is {0}")]
    Time(TimeViolation),
}

impl TokenError {
    /// Stable, low-cardinality label used as the `reason` log field.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Format => "format",
            TokenError::Decode(Segment::Header) => "header_parse",
            TokenError::Decode(Segment::Claims) => "claims_parse",
            TokenError::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            TokenError::Signature => "signature",
            TokenError::Time(TimeViolation::NotYetValid) => "not_yet_valid",
            TokenError::Time(TimeViolation::Expired) => "expired",
        }
    }
}
