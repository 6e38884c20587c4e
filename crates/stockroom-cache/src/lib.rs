// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query cache layer for the Stockroom admin client.
//!
//! [`QueryCache`] maps each [`ListQuery`](stockroom_core::ListQuery) to its
//! last [`ListResult`](stockroom_core::ListResult) with a staleness marker,
//! shares one in-flight fetch between concurrent identical requests, and
//! exposes the invalidation hooks the workflow controller calls after writes.

pub mod cache;

pub use cache::{CachedList, QueryCache};
