// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential resolution: codec, algorithm check, signature, claims and time
//! validation run in sequence, stopping at the first failure.

use chrono::Utc;

use super::claims::{check_time, is_alg_supported, ClaimSet, TokenHeader, HS256};
use super::error::TokenError;
use super::signature::verify_hs256;
use super::token::split;

/// Default clock skew tolerance (30 seconds).
pub const CLOCK_SKEW_LEEWAY: i64 = 30;

/// Verifies compact HS256 tokens against a shared secret.
#[derive(Clone)]
pub struct CredentialResolver {
    secret: Vec<u8>,
    expected_alg: String,
    skew_seconds: i64,
}

impl CredentialResolver {
    /// Create a resolver for `secret` and the configured algorithm.
    ///
    /// An empty `expected_alg` means HS256.
    pub fn new(secret: impl AsRef<[u8]>, expected_alg: impl Into<String>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            expected_alg: expected_alg.into(),
            skew_seconds: CLOCK_SKEW_LEEWAY,
        }
    }

    /// Override the clock skew tolerance.
    pub fn with_skew(mut self, skew_seconds: i64) -> Self {
        self.skew_seconds = skew_seconds;
        self
    }

    pub fn skew_seconds(&self) -> i64 {
        self.skew_seconds
    }

    /// Verify `token` at Unix time `now` and return its claims.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<ClaimSet, TokenError> {
        let parts = split(token)?;

        let header = TokenHeader::parse(parts.header)?;

        if !is_alg_supported(header.alg(), &self.expected_alg) {
            return Err(TokenError::UnsupportedAlgorithm {
                actual: header.alg().to_string(),
                expected: if self.expected_alg.is_empty() {
                    HS256.to_string()
                } else {
                    self.expected_alg.clone()
                },
            });
        }

        if !verify_hs256(parts.header, parts.payload, &self.secret, &parts.signature) {
            return Err(TokenError::Signature);
        }

        let claims = ClaimSet::parse(parts.payload)?;

        check_time(&claims, now, self.skew_seconds).map_err(TokenError::Time)?;

        Ok(claims)
    }

    /// Verify `token` against the current time.
    ///
    /// Failures are logged with their stage before being returned.
    pub fn resolve(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
            .inspect_err(|e| {
                tracing::warn!(reason = e.reason(), error = %e, "Token verification failed");
            })
    }

    /// Validity only; claims are discarded.
    pub fn is_valid(&self, token: &str) -> bool {
        self.resolve(token).is_ok()
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("secret", &"<redacted>")
            .field("expected_alg", &self.expected_alg)
            .field("skew_seconds", &self.skew_seconds)
            .finish()
    }
}
