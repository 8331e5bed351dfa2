// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTPS call to the secrets service.

use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::error::{SecretsError, SecretsResult};
use crate::request::SecretsRequest;
use crate::token::AuthToken;

/// `GetSecrets` endpoint of the public secrets service.
pub const SECRETS_URL: &str = "https://petsem-public.fly.dev/petsem.v1.SecretService/GetSecrets";

const JSON: &str = "application/json";

/// Posts `request` to `url` and returns the raw body of a 200 response.
///
/// Any other status is [`SecretsError::UnexpectedStatus`]. The response is
/// dropped, and its connection released, on every path out of this function.
#[instrument(skip_all, fields(app_id = request.app_id.id))]
pub async fn fetch(
	client: &reqwest::Client,
	url: &str,
	token: &AuthToken,
	request: &SecretsRequest,
) -> SecretsResult<Bytes> {
	let body = serde_json::to_vec(request).map_err(SecretsError::encode)?;

	let mut authorization = HeaderValue::from_str(token.expose()).map_err(SecretsError::encode)?;
	authorization.set_sensitive(true);

	debug!(url = %url, "Fetching secrets");

	let response = client
		.post(url)
		.header(AUTHORIZATION, authorization)
		.header(CONTENT_TYPE, JSON)
		.header(ACCEPT, JSON)
		.body(body)
		.send()
		.await
		.map_err(SecretsError::transport)?;

	let status = response.status();
	if status != StatusCode::OK {
		warn!(status = %status, "Secrets service rejected request");
		return Err(SecretsError::UnexpectedStatus {
			status: status.as_u16(),
		});
	}

	response.bytes().await.map_err(SecretsError::read)
}
