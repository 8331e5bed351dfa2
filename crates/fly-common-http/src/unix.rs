// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP/1.1 over the machine's privileged Unix socket.
//!
//! Fly.io machines get a Unix socket that proxies to the Machines API
//! (`flaps`) and injects a token authorized for the machine's own app. Each
//! call opens a fresh connection, performs one exchange and closes it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::{debug, instrument};

/// Well-known path of the privileged API socket.
pub const SOCKET_PATH: &str = "/.fly/api";

/// Host the proxy expects requests to be addressed to.
const PROXY_HOST: &str = "flaps";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a single socket exchange.
#[derive(Debug, Error)]
pub enum UnixSocketError {
	#[error("failed to connect to {}: {source}", path.display())]
	Connect {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("timed out connecting to {}", path.display())]
	ConnectTimeout { path: PathBuf },

	#[error("invalid request: {0}")]
	InvalidRequest(#[from] hyper::http::Error),

	#[error("request failed: {0}")]
	Request(#[source] hyper::Error),

	#[error("failed to read response body: {0}")]
	Body(#[source] hyper::Error),
}

/// Status and fully buffered body of a socket response.
#[derive(Debug, Clone)]
pub struct UnixResponse {
	pub status: StatusCode,
	pub body: Bytes,
}

/// Client bound to the privileged socket.
#[derive(Debug, Clone)]
pub struct UnixSocketClient {
	socket_path: PathBuf,
	connect_timeout: Duration,
}

impl Default for UnixSocketClient {
	fn default() -> Self {
		Self::new(SOCKET_PATH)
	}
}

impl UnixSocketClient {
	pub fn new(socket_path: impl Into<PathBuf>) -> Self {
		Self {
			socket_path: socket_path.into(),
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
		}
	}

	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;
		self
	}

	pub fn socket_path(&self) -> &Path {
		&self.socket_path
	}

	/// `POST` with an empty body to `path` on the proxy.
	#[instrument(skip(self), fields(socket = %self.socket_path.display()))]
	pub async fn post_empty(&self, path: &str) -> Result<UnixResponse, UnixSocketError> {
		let request = Request::builder()
			.method(Method::POST)
			.uri(path)
			.header(header::HOST, PROXY_HOST)
			.header(header::CONTENT_LENGTH, 0)
			.body(Empty::<Bytes>::new())?;

		let response = self.send(request).await?;
		debug!(status = %response.status, "privileged socket responded");
		Ok(response)
	}

	async fn send(&self, request: Request<Empty<Bytes>>) -> Result<UnixResponse, UnixSocketError> {
		let stream = self.connect().await?;

		let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
			.await
			.map_err(UnixSocketError::Request)?;

		// The connection future must be polled alongside the exchange. It
		// resolves once `sender` is dropped at the end of the exchange.
		let exchange = async move {
			let response = sender
				.send_request(request)
				.await
				.map_err(UnixSocketError::Request)?;
			let status = response.status();
			let body = response
				.into_body()
				.collect()
				.await
				.map_err(UnixSocketError::Body)?
				.to_bytes();
			Ok(UnixResponse { status, body })
		};

		let (result, conn_result) = tokio::join!(exchange, conn);
		if let Err(e) = conn_result {
			debug!(error = %e, "privileged socket connection closed with error");
		}
		result
	}

	async fn connect(&self) -> Result<UnixStream, UnixSocketError> {
		tokio::time::timeout(self.connect_timeout, UnixStream::connect(&self.socket_path))
			.await
			.map_err(|_| UnixSocketError::ConnectTimeout {
				path: self.socket_path.clone(),
			})?
			.map_err(|source| UnixSocketError::Connect {
				path: self.socket_path.clone(),
				source,
			})
	}
}
