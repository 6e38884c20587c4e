// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP resource client for the Stockroom admin client.
//!
//! This crate implements [`ResourceClient`](stockroom_core::ResourceClient)
//! against the generic soft-delete REST API: paginated active and trash
//! listings, single and bulk restore and force-delete, plus the plain
//! create, update, and delete routes each model exposes.

pub mod client;
pub mod wire;

pub use client::HttpResourceClient;
