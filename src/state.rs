// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::extract::FromRef;

use crate::auth::AuthGate;
use crate::proxy::UpstreamProxy;

/// Router state. Both parts are read-only once built.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub gate: AuthGate,
    pub proxy: UpstreamProxy,
}

impl AppState {
    pub fn new(gate: AuthGate, proxy: UpstreamProxy) -> Self {
        Self { gate, proxy }
    }
}
