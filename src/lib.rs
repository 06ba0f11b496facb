// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AuthKit Gateway - cookie session gate
//!
//! This crate verifies HS256-signed session cookies in front of a protected
//! backend and forwards admitted requests with derived identity headers.
//!
//! ## Modules
//!
//! - `api` - Router assembly and health endpoint (Axum)
//! - `auth` - Token codec, signature and claim checks, request gate
//! - `config` - Gate options, `${NAME}` substitution, host settings
//! - `proxy` - Upstream forwarding

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod proxy;
pub mod state;
