// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP plumbing for Fly.io machine clients.
//!
//! This crate provides:
//! - An HTTPS client that trusts only the embedded Mozilla root bundle, so
//!   minimal images without a populated CA store still work
//! - A client for the machine's privileged Unix socket (`/.fly/api`), which
//!   proxies to the Machines API and injects its own credentials

mod client;
pub mod unix;

pub use client::{builder, new_client, user_agent};
pub use unix::{UnixResponse, UnixSocketClient, UnixSocketError, SOCKET_PATH};
