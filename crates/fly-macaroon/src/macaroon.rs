// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! A single macaroon and its token encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rmpv::Value;

use crate::caveat::{Caveat, CaveatSet};
use crate::error::{MacaroonError, Result};

/// Prefix of tokens produced by [`Macaroon::to_token`].
pub const TOKEN_PREFIX: &str = "fm2_";

/// Older prefixes still accepted when decoding.
const LEGACY_PREFIXES: [&str; 2] = ["fm1r_", "fm1a_"];

/// Identifies the root key and randomizes the signature chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
	pub kid: Vec<u8>,
	pub rnd: Vec<u8>,
	/// Set on discharge tokens that prove a third-party caveat.
	pub proof: bool,
}

impl Nonce {
	pub fn new(kid: Vec<u8>, rnd: Vec<u8>) -> Self {
		Self {
			kid,
			rnd,
			proof: false,
		}
	}

	fn decode(value: Value) -> Result<Self> {
		let [kid, rnd, proof]: [Value; 3] = match value {
			Value::Array(fields) => fields
				.try_into()
				.map_err(|_| MacaroonError::malformed("nonce must have 3 fields"))?,
			_ => return Err(MacaroonError::malformed("nonce is not an array")),
		};

		Ok(Self {
			kid: into_binary(kid, "nonce kid")?,
			rnd: into_binary(rnd, "nonce rnd")?,
			proof: proof
				.as_bool()
				.ok_or_else(|| MacaroonError::malformed("nonce proof is not a bool"))?,
		})
	}

	fn encode(&self) -> Value {
		Value::Array(vec![
			Value::Binary(self.kid.clone()),
			Value::Binary(self.rnd.clone()),
			Value::Boolean(self.proof),
		])
	}
}

/// One capability statement: nonce, target location, caveats, signature tail.
#[derive(Debug, Clone, PartialEq)]
pub struct Macaroon {
	nonce: Nonce,
	location: String,
	caveats: CaveatSet,
	tail: Vec<u8>,
}

impl Macaroon {
	/// An unsigned macaroon with no caveats.
	pub fn new(location: impl Into<String>, nonce: Nonce) -> Self {
		Self {
			nonce,
			location: location.into(),
			caveats: CaveatSet::default(),
			tail: Vec::new(),
		}
	}

	pub fn nonce(&self) -> &Nonce {
		&self.nonce
	}

	pub fn location(&self) -> &str {
		&self.location
	}

	pub fn tail(&self) -> &[u8] {
		&self.tail
	}

	pub fn add_caveat(&mut self, caveat: Caveat) {
		self.caveats.push(caveat);
	}

	/// Caveats as decoded, without signature verification.
	pub fn unsafe_caveats(&self) -> &CaveatSet {
		&self.caveats
	}

	/// Decodes one MessagePack macaroon record. The whole input must be
	/// consumed.
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		let mut rd = bytes;
		let value =
			rmpv::decode::read_value(&mut rd).map_err(|e| MacaroonError::Decode(e.to_string()))?;
		if !rd.is_empty() {
			return Err(MacaroonError::TrailingData);
		}

		let [nonce, location, caveats, tail]: [Value; 4] = match value {
			Value::Array(fields) => fields
				.try_into()
				.map_err(|_| MacaroonError::malformed("macaroon must have 4 fields"))?,
			_ => return Err(MacaroonError::malformed("macaroon is not an array")),
		};

		let location = location
			.as_str()
			.ok_or_else(|| MacaroonError::malformed("location is not a string"))?
			.to_owned();

		Ok(Self {
			nonce: Nonce::decode(nonce)?,
			location,
			caveats: CaveatSet::decode(caveats)?,
			tail: into_binary(tail, "tail")?,
		})
	}

	pub fn encode(&self) -> Result<Vec<u8>> {
		let value = Value::Array(vec![
			self.nonce.encode(),
			Value::from(self.location.as_str()),
			self.caveats.encode(),
			Value::Binary(self.tail.clone()),
		]);

		let mut buf = Vec::new();
		rmpv::encode::write_value(&mut buf, &value)
			.map_err(|e| MacaroonError::Encode(e.to_string()))?;
		Ok(buf)
	}

	/// `fm2_` followed by the base64 record.
	pub fn to_token(&self) -> Result<String> {
		Ok(format!("{TOKEN_PREFIX}{}", STANDARD.encode(self.encode()?)))
	}

	/// Decodes one prefixed token segment.
	pub fn from_token(token: &str) -> Result<Self> {
		let token = token.trim();
		if token.is_empty() {
			return Err(MacaroonError::Empty);
		}

		let payload = std::iter::once(TOKEN_PREFIX)
			.chain(LEGACY_PREFIXES)
			.find_map(|prefix| token.strip_prefix(prefix))
			.ok_or(MacaroonError::UnknownPrefix)?;

		Self::decode(&STANDARD.decode(payload)?)
	}
}

fn into_binary(value: Value, what: &str) -> Result<Vec<u8>> {
	match value {
		Value::Binary(bytes) => Ok(bytes),
		_ => Err(MacaroonError::malformed(format!("{what} is not binary"))),
	}
}
