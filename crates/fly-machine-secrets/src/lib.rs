// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client library for Fly.io machines to fetch their app's secrets.
//!
//! A machine holds no long-lived credentials. Instead this crate:
//! 1. Obtains a short-lived macaroon token from the privileged `/.fly/api` socket
//! 2. Derives the app the token is scoped to, locally, from its caveats
//! 3. Requests that app's secrets from the secrets service over HTTPS
//! 4. Returns them as a label → value map
//!
//! Nothing is cached and nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! use fly_machine_secrets::{GetSecretsOptions, SecretsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SecretsClient::new()?;
//!
//!     // All app secrets
//!     let all = client.get(GetSecretsOptions::new()).await?;
//!
//!     // A pinned version of one secret, with a timeout
//!     let db = tokio::time::timeout(
//!         std::time::Duration::from_secs(10),
//!         client.get(
//!             GetSecretsOptions::new()
//!                 .labels(["DATABASE_URL"])
//!                 .with_versions([("DATABASE_URL".to_string(), 3)].into()),
//!         ),
//!     )
//!     .await??;
//!
//!     println!("{} secrets, db set: {}", all.len(), db.contains_key("DATABASE_URL"));
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod mapper;
pub mod request;
pub mod scope;
mod token;
pub mod transport;

pub use client::{get_secrets, ClientConfig, GetSecretsOptions, SecretsClient};
pub use error::{BoxError, SecretsError, SecretsResult};
pub use mapper::decode;
pub use request::{build_request, AppId, SecretSelector, SecretsRequest, SECRET_TYPE_APP};
pub use scope::{resolve_app_scope, SECRETS_LOCATION};
pub use token::{acquire_token, AuthToken, TOKEN_PATH};
pub use transport::{fetch, SECRETS_URL};
