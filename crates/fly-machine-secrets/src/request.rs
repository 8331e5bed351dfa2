// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for `GetSecrets` requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Secret type code for app secrets, the default filter.
pub const SECRET_TYPE_APP: i32 = 1;

/// Which secrets to request.
///
/// Serialized as `{"all":true}` or `{"labels":{"labels":[...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SelectorRepr", try_from = "SelectorRepr")]
pub enum SecretSelector {
	#[default]
	All,
	/// Exactly these labels, in the order given.
	Labels(Vec<String>),
}

impl SecretSelector {
	/// Selects `labels`; an empty list selects everything.
	pub fn labels<I, S>(labels: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
		if labels.is_empty() {
			SecretSelector::All
		} else {
			SecretSelector::Labels(labels)
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
	All { all: bool },
	Labels { labels: LabelList },
}

#[derive(Serialize, Deserialize)]
struct LabelList {
	#[serde(default)]
	labels: Vec<String>,
}

impl From<SecretSelector> for SelectorRepr {
	fn from(selector: SecretSelector) -> Self {
		match selector {
			SecretSelector::All => SelectorRepr::All { all: true },
			SecretSelector::Labels(labels) => SelectorRepr::Labels {
				labels: LabelList { labels },
			},
		}
	}
}

impl TryFrom<SelectorRepr> for SecretSelector {
	type Error = String;

	fn try_from(repr: SelectorRepr) -> Result<Self, Self::Error> {
		match repr {
			SelectorRepr::All { all: true } => Ok(SecretSelector::All),
			SelectorRepr::All { all: false } => {
				Err("selector must set `all` to true or list labels".to_string())
			}
			SelectorRepr::Labels { labels } => Ok(SecretSelector::Labels(labels.labels)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppId {
	pub id: i64,
}

/// Body of a `GetSecrets` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsRequest {
	pub app_id: AppId,
	pub selector: SecretSelector,
	/// Per-label version pins. Omitted from the wire when empty.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub versions: BTreeMap<String, u64>,
	pub types: Vec<i32>,
}

/// Assembles a request for an already-resolved app.
///
/// `None` or an empty label list selects all secrets; `None` or an empty type
/// list selects app secrets only.
pub fn build_request(
	app_id: i64,
	selector: Option<SecretSelector>,
	types: Option<Vec<i32>>,
	versions: BTreeMap<String, u64>,
) -> SecretsRequest {
	let selector = match selector {
		Some(SecretSelector::Labels(labels)) if !labels.is_empty() => {
			SecretSelector::Labels(labels)
		}
		_ => SecretSelector::All,
	};

	let types = types
		.filter(|t| !t.is_empty())
		.unwrap_or_else(|| vec![SECRET_TYPE_APP]);

	SecretsRequest {
		app_id: AppId { id: app_id },
		selector,
		versions,
		types,
	}
}
