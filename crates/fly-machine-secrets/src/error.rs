// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the secrets client.

use fly_macaroon::MacaroonError;
use thiserror::Error;

/// Boxed underlying cause, so both HTTP legs share one variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when fetching secrets.
///
/// Nothing is retried; every variant reaches the caller as-is.
#[derive(Debug, Error)]
pub enum SecretsError {
	/// Connection or request failure on either the socket or HTTPS leg.
	#[error("request failed: {0}")]
	Transport(#[source] BoxError),

	/// Non-success HTTP status.
	#[error("unexpected status code: {status}")]
	UnexpectedStatus { status: u16 },

	/// Response body could not be read in full.
	#[error("failed to read response body: {0}")]
	Read(#[source] BoxError),

	/// Token is not a decodable macaroon bundle.
	#[error("failed to parse token: {0}")]
	TokenParse(#[from] MacaroonError),

	/// Token does not authorize exactly one app.
	#[error("failed to derive app id from token: expected exactly one app, found {found}")]
	AmbiguousScope { found: usize },

	/// Response body is not the expected shape.
	#[error("failed to decode response: {0}")]
	Decode(#[source] serde_json::Error),

	/// Request could not be serialized.
	#[error("failed to encode request: {0}")]
	Encode(#[source] BoxError),

	/// Client could not be constructed.
	#[error("configuration error: {0}")]
	Configuration(String),
}

impl SecretsError {
	pub(crate) fn transport(err: impl Into<BoxError>) -> Self {
		Self::Transport(err.into())
	}

	pub(crate) fn read(err: impl Into<BoxError>) -> Self {
		Self::Read(err.into())
	}

	pub(crate) fn encode(err: impl Into<BoxError>) -> Self {
		Self::Encode(err.into())
	}

	/// HTTP status carried by [`SecretsError::UnexpectedStatus`].
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::UnexpectedStatus { status } => Some(*status),
			_ => None,
		}
	}
}

/// Result type for secrets client operations.
pub type SecretsResult<T> = Result<T, SecretsError>;
