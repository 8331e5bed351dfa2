// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Derives the app a token is scoped to, from the token alone.

use fly_macaroon::{app_scope, Bundle, CaveatSet, MacaroonError};
use tracing::{debug, warn};

use crate::error::{SecretsError, SecretsResult};
use crate::token::AuthToken;

/// Location that secrets tokens are addressed to.
pub const SECRETS_LOCATION: &str = "https://api.fly.io/secrets/v1";

/// Returns `override_app_id` when set and non-zero. Otherwise parses `token`
/// and requires its apps caveats to name exactly one app.
///
/// Never touches the network.
pub fn resolve_app_scope(
	token: &AuthToken,
	override_app_id: Option<i64>,
	location: &str,
) -> SecretsResult<i64> {
	if let Some(app_id) = override_app_id.filter(|id| *id != 0) {
		return Ok(app_id);
	}

	let bundle = Bundle::parse(location, token.expose())?;

	let caveats = bundle.reduce(Vec::new(), |mut all, m| {
		all.extend(m.unsafe_caveats().iter().cloned());
		all
	});
	let scope = app_scope(&CaveatSet::new(caveats));

	match (scope.len(), scope.first()) {
		(1, Some(&app_id)) => {
			let app_id = i64::try_from(app_id).map_err(|_| {
				MacaroonError::Malformed(format!("app id {app_id} out of range"))
			})?;
			debug!(app_id, "Derived app id from token");
			Ok(app_id)
		}
		(found, _) => {
			warn!(found, "Token does not authorize exactly one app");
			Err(SecretsError::AmbiguousScope { found })
		}
	}
}
