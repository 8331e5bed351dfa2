// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization token and its acquisition from the privileged socket.

use std::fmt;

use fly_common_http::{UnixSocketClient, UnixSocketError};
use tracing::{debug, instrument, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{SecretsError, SecretsResult};

/// Path on the privileged socket that issues secrets tokens.
pub const TOKEN_PATH: &str = "/v1/tokens/kms";

/// Token authorized to read one app's secrets.
///
/// Debug and Display are redacted and the buffer is zeroed on drop. Call
/// [`AuthToken::expose`] to read it.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken(String);

impl AuthToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<String> for AuthToken {
	fn from(token: String) -> Self {
		Self(token)
	}
}

impl From<&str> for AuthToken {
	fn from(token: &str) -> Self {
		Self(token.to_string())
	}
}

impl fmt::Debug for AuthToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
	}
}

impl fmt::Display for AuthToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[REDACTED]")
	}
}

/// Returns `override_token` when it is non-empty, otherwise asks the
/// privileged socket for a fresh token.
///
/// The response body is trimmed of surrounding whitespace. An empty 2xx body
/// yields an empty token.
#[instrument(skip_all, fields(socket = %client.socket_path().display()))]
pub async fn acquire_token(
	client: &UnixSocketClient,
	override_token: Option<&AuthToken>,
) -> SecretsResult<AuthToken> {
	if let Some(token) = override_token.filter(|t| !t.is_empty()) {
		debug!("Using caller-supplied token");
		return Ok(token.clone());
	}

	let response = client.post_empty(TOKEN_PATH).await.map_err(|e| match e {
		UnixSocketError::Body(_) => SecretsError::read(e),
		_ => SecretsError::transport(e),
	})?;

	if !response.status.is_success() {
		warn!(status = %response.status, "Token request rejected");
		return Err(SecretsError::UnexpectedStatus {
			status: response.status.as_u16(),
		});
	}

	let text = String::from_utf8_lossy(&response.body);
	let token = AuthToken::new(text.trim());
	debug!(empty = token.is_empty(), "Obtained token");
	Ok(token)
}
