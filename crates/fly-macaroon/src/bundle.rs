// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token bundles as carried in an `Authorization` header.

use tracing::debug;

use crate::error::{MacaroonError, Result};
use crate::macaroon::Macaroon;

/// Authorization scheme of Fly.io tokens.
pub const SCHEME: &str = "FlyV1";

/// Macaroons from one header, addressed relative to a target location.
///
/// Macaroons whose location equals the target are permission tokens; the rest
/// are discharge tokens for third-party caveats.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
	location: String,
	macaroons: Vec<Macaroon>,
}

impl Bundle {
	pub fn from_macaroons(location: impl Into<String>, macaroons: Vec<Macaroon>) -> Self {
		Self {
			location: location.into(),
			macaroons,
		}
	}

	/// Parses a header value (with or without the `FlyV1`/`Bearer` scheme).
	///
	/// Fails closed: any undecodable segment fails the whole bundle, and a
	/// bundle with no permission token for `location` is an error.
	pub fn parse(location: &str, header: &str) -> Result<Self> {
		let tokens = strip_scheme(header.trim());
		if tokens.is_empty() {
			return Err(MacaroonError::Empty);
		}

		let macaroons = tokens
			.split(',')
			.map(Macaroon::from_token)
			.collect::<Result<Vec<_>>>()?;

		let bundle = Self::from_macaroons(location, macaroons);
		let permissions = bundle.permission_tokens().count();
		if permissions == 0 {
			return Err(MacaroonError::NoPermissionToken(location.to_string()));
		}

		debug!(
			permissions,
			discharges = bundle.macaroons.len() - permissions,
			"parsed token bundle"
		);
		Ok(bundle)
	}

	pub fn location(&self) -> &str {
		&self.location
	}

	pub fn len(&self) -> usize {
		self.macaroons.len()
	}

	pub fn is_empty(&self) -> bool {
		self.macaroons.is_empty()
	}

	pub fn permission_tokens(&self) -> impl Iterator<Item = &Macaroon> {
		self.macaroons
			.iter()
			.filter(move |m| m.location() == self.location)
	}

	pub fn discharge_tokens(&self) -> impl Iterator<Item = &Macaroon> {
		self.macaroons
			.iter()
			.filter(move |m| m.location() != self.location)
	}

	/// Folds over every macaroon in header order.
	pub fn reduce<T, F>(&self, init: T, f: F) -> T
	where
		F: FnMut(T, &Macaroon) -> T,
	{
		self.macaroons.iter().fold(init, f)
	}

	/// Renders the bundle as a `FlyV1` header value.
	pub fn to_header(&self) -> Result<String> {
		let tokens = self
			.macaroons
			.iter()
			.map(Macaroon::to_token)
			.collect::<Result<Vec<_>>>()?;
		Ok(format!("{SCHEME} {}", tokens.join(",")))
	}
}

fn strip_scheme(header: &str) -> &str {
	for scheme in [SCHEME, "Bearer"] {
		let matches = header
			.get(..scheme.len())
			.is_some_and(|p| p.eq_ignore_ascii_case(scheme));
		if matches {
			let rest = &header[scheme.len()..];
			if rest.is_empty() || rest.starts_with(char::is_whitespace) {
				return rest.trim_start();
			}
		}
	}
	header
}
