// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Caveats and caveat sets.

use std::collections::{BTreeMap, BTreeSet};

use rmpv::Value;

use crate::error::{MacaroonError, Result};

/// Type code of the caveat restricting a token to a set of apps.
pub const CAV_APPS: u64 = 2;

/// Action granted by [`Caveat::apps`].
const READ_ACTION: &str = "r";

/// One restriction clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Caveat {
	/// Restricts the token to the listed app IDs, each mapped to the action
	/// allowed on it.
	Apps(BTreeMap<u64, Value>),
	/// Any caveat this crate does not interpret, kept verbatim.
	Other { kind: u64, body: Value },
}

impl Caveat {
	/// Read-only access to each of `ids`.
	pub fn apps(ids: impl IntoIterator<Item = u64>) -> Self {
		Caveat::Apps(
			ids.into_iter()
				.map(|id| (id, Value::from(READ_ACTION)))
				.collect(),
		)
	}

	pub fn kind(&self) -> u64 {
		match self {
			Caveat::Apps(_) => CAV_APPS,
			Caveat::Other { kind, .. } => *kind,
		}
	}

	/// App IDs this caveat names, if it is an apps caveat.
	pub fn app_ids(&self) -> Option<impl Iterator<Item = u64> + '_> {
		match self {
			Caveat::Apps(apps) => Some(apps.keys().copied()),
			Caveat::Other { .. } => None,
		}
	}

	fn decode(kind: u64, body: Value) -> Result<Self> {
		match kind {
			CAV_APPS => Ok(Caveat::Apps(decode_app_map(&body)?)),
			_ => Ok(Caveat::Other { kind, body }),
		}
	}

	fn body(&self) -> Value {
		match self {
			// Struct bodies are encoded as arrays of their fields.
			Caveat::Apps(apps) => Value::Array(vec![Value::Map(
				apps.iter()
					.map(|(id, action)| (Value::from(*id), action.clone()))
					.collect(),
			)]),
			Caveat::Other { body, .. } => body.clone(),
		}
	}
}

fn decode_app_map(body: &Value) -> Result<BTreeMap<u64, Value>> {
	let map = match body {
		Value::Array(fields) if fields.len() == 1 => &fields[0],
		other => other,
	};
	let entries = map
		.as_map()
		.ok_or_else(|| MacaroonError::malformed("apps caveat body is not a map"))?;

	entries
		.iter()
		.map(|(id, action)| {
			let id = id
				.as_u64()
				.ok_or_else(|| MacaroonError::malformed("app id is not an unsigned integer"))?;
			Ok((id, action.clone()))
		})
		.collect()
}

/// Ordered caveats of one or more macaroons. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaveatSet {
	caveats: Vec<Caveat>,
}

impl CaveatSet {
	pub fn new(caveats: Vec<Caveat>) -> Self {
		Self { caveats }
	}

	pub fn push(&mut self, caveat: Caveat) {
		self.caveats.push(caveat);
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Caveat> {
		self.caveats.iter()
	}

	pub fn len(&self) -> usize {
		self.caveats.len()
	}

	pub fn is_empty(&self) -> bool {
		self.caveats.is_empty()
	}

	/// Decodes the wire form: a flat array alternating type code and body.
	pub(crate) fn decode(value: Value) -> Result<Self> {
		let items = match value {
			Value::Array(items) => items,
			Value::Nil => Vec::new(),
			_ => return Err(MacaroonError::malformed("caveat set is not an array")),
		};
		if items.len() % 2 != 0 {
			return Err(MacaroonError::malformed("caveat set has odd length"));
		}

		let mut caveats = Vec::with_capacity(items.len() / 2);
		let mut items = items.into_iter();
		while let (Some(kind), Some(body)) = (items.next(), items.next()) {
			let kind = kind
				.as_u64()
				.ok_or_else(|| MacaroonError::malformed("caveat type is not an unsigned integer"))?;
			caveats.push(Caveat::decode(kind, body)?);
		}
		Ok(Self { caveats })
	}

	pub(crate) fn encode(&self) -> Value {
		Value::Array(
			self.caveats
				.iter()
				.flat_map(|c| [Value::from(c.kind()), c.body()])
				.collect(),
		)
	}
}

impl<'a> IntoIterator for &'a CaveatSet {
	type Item = &'a Caveat;
	type IntoIter = std::slice::Iter<'a, Caveat>;

	fn into_iter(self) -> Self::IntoIter {
		self.caveats.iter()
	}
}

impl FromIterator<Caveat> for CaveatSet {
	fn from_iter<I: IntoIterator<Item = Caveat>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

/// Distinct app IDs named by the apps caveats in `caveats`.
///
/// Empty when no apps caveat is present.
pub fn app_scope(caveats: &CaveatSet) -> BTreeSet<u64> {
	caveats
		.iter()
		.filter_map(Caveat::app_ids)
		.flatten()
		.collect()
}
