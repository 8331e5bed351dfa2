// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secrets client implementation.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use fly_common_env::MachineEnv;
use fly_common_http::{UnixSocketClient, SOCKET_PATH};
use tracing::{debug, instrument};

use crate::error::{SecretsError, SecretsResult};
use crate::mapper::decode;
use crate::request::{build_request, SecretSelector};
use crate::scope::{resolve_app_scope, SECRETS_LOCATION};
use crate::token::{acquire_token, AuthToken};
use crate::transport::{fetch, SECRETS_URL};

/// Configuration for the secrets client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// `GetSecrets` endpoint.
	pub secrets_url: String,
	/// Privileged socket that issues tokens.
	pub socket_path: PathBuf,
	/// Location secrets tokens are addressed to.
	pub token_location: String,
	/// Whether to allow a plain HTTP `secrets_url` (local testing only).
	/// Default: false (require HTTPS)
	pub allow_insecure: bool,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			secrets_url: SECRETS_URL.to_string(),
			socket_path: PathBuf::from(SOCKET_PATH),
			token_location: SECRETS_LOCATION.to_string(),
			allow_insecure: false,
		}
	}
}

/// Per-call overrides. Every field is optional.
///
/// - `client`: HTTPS client; defaults to one trusting only embedded roots
/// - `token`: skips token acquisition when non-empty
/// - `app_id`: skips deriving the app from the token when non-zero
/// - `versions`: per-label version pins; none by default
/// - `labels`: select these labels; all secrets by default
/// - `types`: secret type codes; app secrets only by default
#[derive(Debug, Clone, Default)]
pub struct GetSecretsOptions {
	pub client: Option<reqwest::Client>,
	pub token: Option<AuthToken>,
	pub app_id: Option<i64>,
	pub versions: BTreeMap<String, u64>,
	pub labels: Option<Vec<String>>,
	pub types: Option<Vec<i32>>,
}

impl GetSecretsOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = Some(client);
		self
	}

	pub fn with_token(mut self, token: impl Into<AuthToken>) -> Self {
		self.token = Some(token.into());
		self
	}

	pub fn with_app_id(mut self, app_id: i64) -> Self {
		self.app_id = Some(app_id);
		self
	}

	pub fn with_versions(mut self, versions: BTreeMap<String, u64>) -> Self {
		self.versions = versions;
		self
	}

	pub fn labels<I, S>(mut self, labels: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.labels = Some(labels.into_iter().map(Into::into).collect());
		self
	}

	pub fn types(mut self, types: impl IntoIterator<Item = i32>) -> Self {
		self.types = Some(types.into_iter().collect());
		self
	}
}

/// Client for fetching the current machine's app secrets.
///
/// Holds no per-call state; share it freely across tasks.
#[derive(Debug, Clone)]
pub struct SecretsClient {
	http_client: reqwest::Client,
	privileged: UnixSocketClient,
	secrets_url: String,
	token_location: String,
	machine: MachineEnv,
}

impl SecretsClient {
	/// Create a new secrets client with default configuration.
	pub fn new() -> SecretsResult<Self> {
		Self::with_config(ClientConfig::default())
	}

	/// Create a client with a specific configuration.
	pub fn with_config(config: ClientConfig) -> SecretsResult<Self> {
		Self::with_env(config, MachineEnv::current().clone())
	}

	/// Create a client with a specific configuration and machine environment.
	pub fn with_env(config: ClientConfig, machine: MachineEnv) -> SecretsResult<Self> {
		if !config.allow_insecure && !config.secrets_url.starts_with("https://") {
			return Err(SecretsError::Configuration(
				"secrets URL must use HTTPS (set allow_insecure=true for local testing)".into(),
			));
		}

		let http_client = fly_common_http::new_client().map_err(|e| {
			SecretsError::Configuration(format!("failed to create HTTP client: {e}"))
		})?;

		Ok(Self {
			http_client,
			privileged: UnixSocketClient::new(config.socket_path),
			secrets_url: config.secrets_url,
			token_location: config.token_location,
			machine,
		})
	}

	/// Fetches a token for this machine's app from the privileged socket.
	pub async fn token(&self) -> SecretsResult<AuthToken> {
		acquire_token(&self.privileged, None).await
	}

	/// Fetches secrets as a label → value map.
	///
	/// With default options this fetches a token from the privileged socket,
	/// derives the app from it and requests all app secrets. Either every
	/// secret is returned or an error is.
	///
	/// Dropping the returned future aborts any in-flight request.
	#[instrument(
		skip_all,
		fields(machine_id = ?self.machine.machine_id, region = ?self.machine.region)
	)]
	pub async fn get(&self, options: GetSecretsOptions) -> SecretsResult<HashMap<String, String>> {
		let GetSecretsOptions {
			client,
			token,
			app_id,
			versions,
			labels,
			types,
		} = options;

		let token = acquire_token(&self.privileged, token.as_ref()).await?;
		let app_id = resolve_app_scope(&token, app_id, &self.token_location)?;

		let request = build_request(app_id, labels.map(SecretSelector::labels), types, versions);

		let http_client = client.as_ref().unwrap_or(&self.http_client);
		let body = fetch(http_client, &self.secrets_url, &token, &request).await?;
		let secrets = decode(&body)?;

		debug!(app_id, count = secrets.len(), "Fetched secrets");
		Ok(secrets)
	}
}

/// One-shot fetch with a default-configured client.
pub async fn get_secrets(options: GetSecretsOptions) -> SecretsResult<HashMap<String, String>> {
	SecretsClient::new()?.get(options).await
}
