// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTPS client with embedded trust roots and a consistent User-Agent.

use reqwest::{Client, ClientBuilder};

/// Creates a new HTTPS client with the standard User-Agent and embedded roots.
pub fn new_client() -> Result<Client, reqwest::Error> {
	builder().build()
}

/// Creates a client builder preconfigured for talking to Fly.io services.
///
/// TLS goes through rustls and trusts only the webpki (Mozilla) root bundle
/// compiled into the binary. The host trust store is never consulted.
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = fly_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.use_rustls_tls()
		.tls_built_in_root_certs(true)
}

/// Returns the standard User-Agent string.
///
/// Format: `fly-machine-secrets/{version}`
pub fn user_agent() -> String {
	format!("fly-machine-secrets/{}", env!("CARGO_PKG_VERSION"))
}
