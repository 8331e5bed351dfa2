// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decodes `GetSecrets` responses into a label → value map.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{SecretsError, SecretsResult};

/// One returned secret.
#[derive(Deserialize)]
pub struct SecretEntry {
	pub label: String,
	/// Raw value; base64 on the wire.
	#[serde(default, deserialize_with = "base64_bytes")]
	pub value: Vec<u8>,
}

impl Drop for SecretEntry {
	fn drop(&mut self) {
		self.value.zeroize();
	}
}

#[derive(Deserialize)]
struct GetSecretsResponse {
	#[serde(default)]
	secrets: Option<Vec<SecretEntry>>,
}

fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<String>::deserialize(deserializer)? {
		Some(encoded) => STANDARD
			.decode(encoded.as_bytes())
			.map_err(serde::de::Error::custom),
		None => Ok(Vec::new()),
	}
}

/// Builds the label → value map from a raw response body.
///
/// Values are read as UTF-8, replacing invalid sequences. When a label
/// repeats, the later entry wins.
pub fn decode(raw: &[u8]) -> SecretsResult<HashMap<String, String>> {
	let response: GetSecretsResponse = serde_json::from_slice(raw).map_err(SecretsError::Decode)?;
	let entries = response.secrets.unwrap_or_default();

	let mut secrets = HashMap::with_capacity(entries.len());
	for entry in &entries {
		let value = String::from_utf8_lossy(&entry.value).into_owned();
		if let Some(mut previous) = secrets.insert(entry.label.clone(), value) {
			debug!(label = %entry.label, "Duplicate label in response, keeping the later value");
			previous.zeroize();
		}
	}

	Ok(secrets)
}
