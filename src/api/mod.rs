// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{auth::authkit_middleware, proxy, state::AppState};

pub mod health;

/// Build the gateway router.
///
/// `/health/live` answers directly; every other request goes through the
/// AuthKit gate and, if admitted, to the upstream.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authkit_middleware,
        ));

    Router::new()
        .route("/health/live", get(health::liveness))
        .merge(gated)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
