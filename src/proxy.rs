// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Forwarding of admitted requests to the protected backend.
//!
//! Requests and responses are buffered in full. Hop-by-hop headers, including
//! any named in `Connection`, are dropped in both directions.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING, UPGRADE},
        HeaderMap, HeaderName, Uri,
    },
    response::Response,
    BoxError,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use url::Url;

use crate::error::ApiError;

/// Largest request body forwarded upstream (10 MiB).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [&str; 6] = [
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailers",
];

/// HTTP client bound to one upstream base URL.
#[derive(Clone, Debug)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    base: Url,
}

impl UpstreamProxy {
    /// Create a forwarder for `base` with a per-request `timeout`.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client, base })
    }

    /// Upstream URL for an inbound request URI.
    ///
    /// The inbound path and query are appended to the base URL's path.
    pub fn target_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let mut base = self.base.clone();
        base.set_query(None);
        base.set_fragment(None);

        format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query)
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(CONNECTION);
    headers.remove(TRANSFER_ENCODING);
    headers.remove(UPGRADE);
}

/// Map a failure to buffer the inbound body.
///
/// Only the size limit is a 413; a broken or aborted body is a 400.
fn body_error(error: BoxError) -> ApiError {
    if error.is::<LengthLimitError>() {
        tracing::debug!("Request body exceeds forwarding limit");
        ApiError::payload_too_large()
    } else {
        tracing::warn!(error = %error, "Failed to read request body");
        ApiError::bad_request("Bad Request")
    }
}

/// Fallback handler that forwards the request upstream.
pub async fn forward(
    State(proxy): State<UpstreamProxy>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let body = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(body_error)?
        .to_bytes();

    let url = proxy.target_url(&parts.uri);

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST);
    headers.remove(CONTENT_LENGTH);

    let upstream = proxy
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, upstream = %url, "Upstream request failed");
            ApiError::bad_gateway()
        })?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(CONTENT_LENGTH);

    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::error!(error = %e, upstream = %url, "Failed to read upstream response");
        ApiError::bad_gateway()
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
