// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie session gate for Axum.
//!
//! Every request except `OPTIONS` pre-flights runs through the same steps:
//!
//! 1. Drop any client-sent `X-AuthKit-*` headers, then derive the caller IP
//!    and set it as `X-IP`.
//! 2. Verify the access-token cookie. On success, add the identity headers
//!    and hand the request to the next service.
//! 3. Otherwise verify the refresh-token cookie. A valid refresh token gets
//!    a 401 with message `REFRESH`; anything else gets a plain 401.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let gate = AuthGate::new(config_gate.get_or_resolve(&raw_config));
//!
//! let app = Router::new()
//!     .fallback(proxy::forward)
//!     .layer(axum::middleware::from_fn_with_state(gate, authkit_middleware));
//! ```
//!
//! The caller IP prefers the first `X-Forwarded-For` entry. That header is
//! taken at face value, so the gate must sit behind a proxy that overwrites it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::COOKIE, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;

use super::claims::ClaimSet;
use super::resolver::CredentialResolver;
use crate::config::ResolvedConfig;
use crate::error::{ApiError, UNAUTHORIZED_MESSAGE};

/// Caller IP as derived by the gate.
pub const X_IP: HeaderName = HeaderName::from_static("x-ip");
/// Set to `true` when the access token verified.
pub const X_AUTHKIT_VALID: HeaderName = HeaderName::from_static("x-authkit-valid");
/// The raw, verified access token.
pub const X_AUTHKIT_TOKEN: HeaderName = HeaderName::from_static("x-authkit-token");
/// JSON serialization of the `user` claim.
pub const X_AUTHKIT_USER: HeaderName = HeaderName::from_static("x-authkit-user");

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Shared, read-only state of the gate.
#[derive(Clone)]
pub struct AuthGate {
    config: Arc<ResolvedConfig>,
    resolver: Arc<CredentialResolver>,
}

/// What the gate does with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Access token verified; forward with identity headers.
    Forward { token: String, claims: ClaimSet },
    /// Access token unusable but the refresh token verified.
    RejectRefresh,
    /// Neither token verified.
    Reject,
}

impl AuthGate {
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        tracing::info!(
            access_cookie = %config.jwt_cookie_name,
            refresh_cookie = %config.refresh_cookie_name,
            algorithm = %config.jwt_algorithm,
            "Initializing AuthKit middleware"
        );

        let resolver = CredentialResolver::new(&config.jwt_secret, config.jwt_algorithm.clone())
            .with_skew(config.clock_skew_seconds);

        Self {
            config,
            resolver: Arc::new(resolver),
        }
    }

    /// Decide the fate of a request from its cookies.
    ///
    /// `ip` is only used for logging.
    pub fn decide(&self, headers: &HeaderMap, ip: &str) -> GateDecision {
        if let Some(token) = find_cookie(headers, &self.config.jwt_cookie_name) {
            match self.resolver.resolve(&token) {
                Ok(claims) => return GateDecision::Forward { token, claims },
                Err(e) => {
                    tracing::warn!(ip = %ip, reason = e.reason(), "Invalid access token");
                }
            }
        }

        if let Some(refresh) = find_cookie(headers, &self.config.refresh_cookie_name) {
            if self.resolver.is_valid(&refresh) {
                tracing::info!(ip = %ip, "Access token rejected, refresh token still valid");
                return GateDecision::RejectRefresh;
            }
        }

        tracing::warn!(ip = %ip, "Authentication failed");
        GateDecision::Reject
    }
}

/// Value of the first cookie called `name`, across all `Cookie` headers.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// Derive the caller IP.
///
/// The first comma-separated entry of `X-Forwarded-For` wins when the header
/// is present and non-empty; it is not trimmed. Otherwise the host part of
/// the connection address is used, or the empty string if there is none.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    match (forwarded, remote) {
        (Some(xff), _) => xff.split(',').next().unwrap_or_default().to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => String::new(),
    }
}

/// Remove identity headers the client sent itself.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(X_AUTHKIT_VALID);
    headers.remove(X_AUTHKIT_TOKEN);
    headers.remove(X_AUTHKIT_USER);
}

/// Add the derived identity headers for a verified access token.
pub fn apply_identity_headers(headers: &mut HeaderMap, token: &str, claims: &ClaimSet) {
    headers.insert(X_AUTHKIT_VALID, HeaderValue::from_static("true"));

    match HeaderValue::from_str(token) {
        Ok(value) => {
            headers.insert(X_AUTHKIT_TOKEN, value);
        }
        Err(_) => tracing::warn!("Verified token is not a valid header value"),
    }

    if let Some(user) = claims.user() {
        let json = serde_json::to_string(user).unwrap_or_default();
        match HeaderValue::from_bytes(json.as_bytes()) {
            Ok(value) => {
                headers.insert(X_AUTHKIT_USER, value);
            }
            Err(_) => tracing::warn!("User claim cannot be carried in a header, skipping"),
        }
    }
}

/// Authentication middleware function.
pub async fn authkit_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    strip_identity_headers(request.headers_mut());

    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), remote);
    if let Ok(value) = HeaderValue::from_str(&ip) {
        request.headers_mut().insert(X_IP, value);
    }

    match gate.decide(request.headers(), &ip) {
        GateDecision::Forward { token, claims } => {
            apply_identity_headers(request.headers_mut(), &token, &claims);
            next.run(request).await
        }
        GateDecision::RejectRefresh => ApiError::refresh_required().into_response(),
        GateDecision::Reject => ApiError::unauthorized(UNAUTHORIZED_MESSAGE).into_response(),
    }
}
