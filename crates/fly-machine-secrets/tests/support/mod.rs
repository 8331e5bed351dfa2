// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures: token builders and a stand-in for the privileged socket.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fly_common_http::UnixSocketClient;
use fly_machine_secrets::{ClientConfig, SECRETS_LOCATION};
use fly_macaroon::{Bundle, Caveat, Macaroon, Nonce};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

pub const GET_SECRETS_PATH: &str = "/petsem.v1.SecretService/GetSecrets";

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter("debug")
		.with_test_writer()
		.try_init();
}

/// `FlyV1` header holding one secrets macaroon scoped to `apps`.
pub fn token_for(apps: &[u64]) -> String {
	let mut mac = Macaroon::new(
		SECRETS_LOCATION,
		Nonce::new(b"test-kid".to_vec(), b"test-rnd".to_vec()),
	);
	if !apps.is_empty() {
		mac.add_caveat(Caveat::apps(apps.iter().copied()));
	}
	Bundle::from_macaroons(SECRETS_LOCATION, vec![mac])
		.to_header()
		.unwrap()
}

/// Serves canned HTTP responses on a Unix socket in a temp directory.
pub struct TokenSocket {
	_dir: TempDir,
	path: PathBuf,
	hits: Arc<AtomicUsize>,
	task: JoinHandle<()>,
}

impl TokenSocket {
	/// Replies `status` with `body` and an accurate Content-Length.
	pub fn start(status: &str, body: &str) -> Self {
		let reply = format!(
			"HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
			body.len()
		);
		Self::start_raw(reply)
	}

	/// Replies with `reply` verbatim.
	pub fn start_raw(reply: String) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("api.sock");
		let listener = UnixListener::bind(&path).unwrap();
		let hits = Arc::new(AtomicUsize::new(0));

		let task = tokio::spawn(serve(listener, reply, hits.clone()));

		Self {
			_dir: dir,
			path,
			hits,
			task,
		}
	}

	pub fn path(&self) -> PathBuf {
		self.path.clone()
	}

	pub fn hits(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}

	pub fn client(&self) -> UnixSocketClient {
		UnixSocketClient::new(self.path())
	}

	/// Client config pointing at this socket and a plain-HTTP secrets URL.
	pub fn config(&self, server_uri: &str) -> ClientConfig {
		ClientConfig {
			secrets_url: format!("{server_uri}{GET_SECRETS_PATH}"),
			socket_path: self.path(),
			allow_insecure: true,
			..ClientConfig::default()
		}
	}
}

impl Drop for TokenSocket {
	fn drop(&mut self) {
		self.task.abort();
	}
}

async fn serve(listener: UnixListener, reply: String, hits: Arc<AtomicUsize>) {
	while let Ok((mut stream, _)) = listener.accept().await {
		hits.fetch_add(1, Ordering::SeqCst);

		let mut head = Vec::new();
		let mut buf = [0u8; 1024];
		while !head.windows(4).any(|w| w == b"\r\n\r\n") {
			match stream.read(&mut buf).await {
				Ok(0) | Err(_) => break,
				Ok(n) => head.extend_from_slice(&buf[..n]),
			}
		}

		let _ = stream.write_all(reply.as_bytes()).await;
		let _ = stream.shutdown().await;
	}
}
