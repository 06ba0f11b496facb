// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie-based session verification for the AuthKit gateway.
//!
//! ## Auth Flow
//!
//! 1. The issuer sets two cookies: a short-lived access token and a
//!    longer-lived refresh token, both compact HS256 tokens.
//! 2. For every request the gate:
//!    - splits the access token and decodes its header
//!    - requires `alg` to be HS256
//!    - checks the HMAC-SHA256 signature in constant time
//!    - decodes the claims and checks `nbf` / `exp`
//! 3. A verified access token adds `X-AuthKit-*` headers and the request is
//!    forwarded. Otherwise the refresh token decides between a `REFRESH`
//!    hint and a plain `Unauthorized`.
//!
//! ## Security
//!
//! - Only HS256 is accepted, whatever the header or configuration says
//! - Signature comparison is constant-time
//! - Clock skew tolerance is 30 seconds by default
//! - Missing `nbf` / `exp` claims do not restrict validity

pub mod claims;
pub mod error;
pub mod middleware;
pub mod resolver;
pub mod signature;
pub mod token;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::ClaimSet;
pub use error::TokenError;
pub use middleware::{authkit_middleware, AuthGate, GateDecision};
pub use resolver::CredentialResolver;
