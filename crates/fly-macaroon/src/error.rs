// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for token decoding.
//!
//! Messages never include token text.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, MacaroonError>;

/// Errors that can occur while decoding or encoding a bundle.
#[derive(Debug, Error)]
pub enum MacaroonError {
	/// Header or token segment was empty.
	#[error("token is empty")]
	Empty,

	/// Token segment did not start with a known version prefix.
	#[error("unrecognized token prefix")]
	UnknownPrefix,

	/// Token payload was not valid base64.
	#[error("invalid base64 in token: {0}")]
	Base64(#[from] base64::DecodeError),

	/// Token payload was not valid MessagePack.
	#[error("invalid msgpack in token: {0}")]
	Decode(String),

	/// Bytes remained after the macaroon record.
	#[error("unexpected trailing data after macaroon")]
	TrailingData,

	/// MessagePack was valid but did not have the macaroon shape.
	#[error("malformed macaroon: {0}")]
	Malformed(String),

	/// No macaroon in the bundle targets the requested location.
	#[error("no permission token for location {0}")]
	NoPermissionToken(String),

	/// Failed to serialize a macaroon.
	#[error("failed to encode macaroon: {0}")]
	Encode(String),
}

impl MacaroonError {
	pub(crate) fn malformed(what: impl Into<String>) -> Self {
		Self::Malformed(what.into())
	}
}
