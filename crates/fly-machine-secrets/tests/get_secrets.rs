// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end retrieval: privileged socket → scope → secrets service.

mod support;

use std::collections::BTreeMap;
use std::time::Duration;

use fly_machine_secrets::{GetSecretsOptions, SecretsClient, SecretsError};
use serde_json::json;
use support::{init_tracing, token_for, TokenSocket, GET_SECRETS_PATH};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn secrets_body(entries: &[(&str, &str)]) -> serde_json::Value {
	json!({
		"secrets": entries
			.iter()
			.map(|(label, value)| json!({"label": label, "value": value}))
			.collect::<Vec<_>>()
	})
}

#[tokio::test]
async fn fetches_all_app_secrets_with_derived_app_id() {
	init_tracing();
	let token = token_for(&[4242]);
	let socket = TokenSocket::start("200 OK", &format!("{token}\n"));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path(GET_SECRETS_PATH))
		.and(header("authorization", token.as_str()))
		.and(header("content-type", "application/json"))
		.and(header("accept", "application/json"))
		.and(body_json(json!({
			"app_id": {"id": 4242},
			"selector": {"all": true},
			"types": [1],
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[
			("DATABASE_URL", "cG9zdGdyZXM6Ly9kYg=="),
			("API_KEY", "c2stMTIz"),
		])))
		.expect(1)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let secrets = client.get(GetSecretsOptions::new()).await.unwrap();

	assert_eq!(secrets.len(), 2);
	assert_eq!(secrets["DATABASE_URL"], "postgres://db");
	assert_eq!(secrets["API_KEY"], "sk-123");
	assert_eq!(socket.hits(), 1);
}

#[tokio::test]
async fn sends_labels_types_and_version_pins() {
	let socket = TokenSocket::start("200 OK", &token_for(&[7]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path(GET_SECRETS_PATH))
		.and(body_json(json!({
			"app_id": {"id": 7},
			"selector": {"labels": {"labels": ["DB_URL", "API_KEY"]}},
			"versions": {"DB_URL": 3},
			"types": [1, 4],
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[("DB_URL", "eA==")])))
		.expect(1)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let secrets = client
		.get(
			GetSecretsOptions::new()
				.labels(["DB_URL", "API_KEY"])
				.types([1, 4])
				.with_versions(BTreeMap::from([("DB_URL".to_string(), 3)])),
		)
		.await
		.unwrap();

	assert_eq!(secrets["DB_URL"], "x");
}

#[tokio::test]
async fn duplicate_labels_keep_the_last_value() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path(GET_SECRETS_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_string(
			r#"{"secrets":[{"label":"A","value":"eA=="},{"label":"A","value":"eQ=="}]}"#,
		))
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let secrets = client.get(GetSecretsOptions::new()).await.unwrap();

	assert_eq!(secrets.len(), 1);
	assert_eq!(secrets["A"], "y");
}

#[tokio::test]
async fn forbidden_is_unexpected_status_without_secrets() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path(GET_SECRETS_PATH))
		.respond_with(
			ResponseTemplate::new(403).set_body_json(secrets_body(&[("LEAKED", "eA==")])),
		)
		.expect(1)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::UnexpectedStatus { status: 403 }));
	assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn non_200_success_is_still_rejected() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(204))
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert_eq!(err.status(), Some(204));
}

#[tokio::test]
async fn overrides_skip_socket_and_scope_parsing() {
	let socket = TokenSocket::start("500 Internal Server Error", "");
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(header("authorization", "FlyV1 fm2_supplied"))
		.and(body_json(json!({
			"app_id": {"id": 99},
			"selector": {"all": true},
			"types": [1],
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[])))
		.expect(1)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let secrets = client
		.get(
			GetSecretsOptions::new()
				.with_token("FlyV1 fm2_supplied")
				.with_app_id(99),
		)
		.await
		.unwrap();

	assert!(secrets.is_empty());
	assert_eq!(socket.hits(), 0);
}

#[tokio::test]
async fn caller_supplied_http_client_is_used() {
	let socket = TokenSocket::start("200 OK", &token_for(&[3]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(header("x-probe", "custom-client"))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[("K", "eA==")])))
		.expect(1)
		.mount(&server)
		.await;

	let mut headers = reqwest::header::HeaderMap::new();
	headers.insert("x-probe", "custom-client".parse().unwrap());
	let custom = reqwest::Client::builder()
		.default_headers(headers)
		.build()
		.unwrap();

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let secrets = client
		.get(GetSecretsOptions::new().with_client(custom))
		.await
		.unwrap();

	assert_eq!(secrets["K"], "x");
}

#[tokio::test]
async fn ambiguous_token_never_reaches_the_service() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1, 2]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[])))
		.expect(0)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::AmbiguousScope { found: 2 }));
}

#[tokio::test]
async fn unscoped_token_is_rejected() {
	let socket = TokenSocket::start("200 OK", &token_for(&[]));
	let server = MockServer::start().await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::AmbiguousScope { found: 0 }));
}

#[tokio::test]
async fn empty_token_from_socket_is_parse_error() {
	let socket = TokenSocket::start("200 OK", "\n");
	let server = MockServer::start().await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::TokenParse(_)));
}

#[tokio::test]
async fn token_endpoint_failure_stops_the_flow() {
	let socket = TokenSocket::start("503 Service Unavailable", "");
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200))
		.expect(0)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::UnexpectedStatus { status: 503 }));
}

#[tokio::test]
async fn malformed_response_is_decode_error() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_string(r#"{"secrets":"nope"}"#))
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let err = client.get(GetSecretsOptions::new()).await.unwrap_err();

	assert!(matches!(err, SecretsError::Decode(_)));
}

#[tokio::test]
async fn dropping_the_call_on_timeout_returns_nothing() {
	let socket = TokenSocket::start("200 OK", &token_for(&[1]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(secrets_body(&[("A", "eA==")]))
				.set_delay(Duration::from_secs(5)),
		)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let result = tokio::time::timeout(
		Duration::from_millis(200),
		client.get(GetSecretsOptions::new()),
	)
	.await;

	assert!(result.is_err(), "call should have been cut off");
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
	let socket = TokenSocket::start("200 OK", &token_for(&[5]));
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(secrets_body(&[("A", "eA==")])))
		.expect(4)
		.mount(&server)
		.await;

	let client = SecretsClient::with_config(socket.config(&server.uri())).unwrap();
	let calls = (0..4).map(|_| {
		let client = client.clone();
		tokio::spawn(async move { client.get(GetSecretsOptions::new()).await })
	});

	for call in calls.collect::<Vec<_>>() {
		let secrets = call.await.unwrap().unwrap();
		assert_eq!(secrets["A"], "x");
	}
	assert_eq!(socket.hits(), 4);
}
