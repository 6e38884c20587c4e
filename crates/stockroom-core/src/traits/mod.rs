// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits. All use `#[async_trait]` for dynamic dispatch.

pub mod client;

pub use client::ResourceClient;
