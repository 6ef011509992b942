#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
// self
use common::*;
use spotify_auth_relay::{
	auth::Secret,
	config::ClientConfig,
	error::{ConfigError, Error, NetworkError},
	provider::ClientAuthMethod,
};

#[tokio::test]
async fn exchange_returns_bundle_from_token_endpoint() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header_exists("authorization")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "abc123")
				.form_urlencoded_tuple("redirect_uri", REDIRECT_URI);
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-ok\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"refresh-ok\",\"scope\":\"streaming user-read-playback-state\"}",
				);
		})
		.await;
	let bundle = exchanger.exchange("abc123").await.expect("Exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(bundle.access_token.expose(), "access-ok");
	assert_eq!(bundle.refresh_token.as_ref().map(Secret::expose), Some("refresh-ok"));
	assert_eq!(bundle.expires_in, time::Duration::hours(1));
	assert!(bundle.scope.as_ref().is_some_and(|scope| scope.contains("streaming")));

	let payload = bundle.to_payload();

	assert_eq!(payload.access_token, "access-ok");
	assert_eq!(payload.expires_in, 3600);
	assert_eq!(exchanger.metrics.successes(), 1);
	assert_eq!(exchanger.metrics.retries(), 0);
}

#[tokio::test]
async fn pathless_redirect_uri_is_sent_as_configured() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new(CLIENT_ID, "http://localhost:8888")
		.with_client_secret(CLIENT_SECRET);
	let exchanger = build_exchanger_with(&server, ClientAuthMethod::ClientSecretBasic, config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("redirect_uri", "http://localhost:8888");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"verbatim\",\"token_type\":\"bearer\",\"expires_in\":60}",
				);
		})
		.await;
	let bundle = exchanger.exchange("abc123").await.expect("Exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(bundle.access_token.expose(), "verbatim");
}

#[tokio::test]
async fn client_secret_post_sends_credentials_in_body() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretPost);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"posted\",\"token_type\":\"bearer\",\"expires_in\":60}");
		})
		.await;
	let bundle = exchanger.exchange("abc123").await.expect("Exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(bundle.access_token.expose(), "posted");
	assert!(bundle.refresh_token.is_none());
}

#[tokio::test]
async fn rejected_code_is_invalid_grant_and_not_retried() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(
					"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid authorization code\"}",
				);
		})
		.await;
	let err = exchanger.exchange("bad-code").await.expect_err("Exchange should fail.");

	mock.assert_calls_async(1).await;

	assert!(
		matches!(&err, Error::InvalidGrant { reason } if reason == "Invalid authorization code")
	);
	assert_eq!(exchanger.metrics.failures(), 1);
}

#[tokio::test]
async fn redirect_mismatch_is_a_configuration_error() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(
					"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid redirect URI\"}",
				);
		})
		.await;
	let err = exchanger.exchange("abc123").await.expect_err("Exchange should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Config(ConfigError::ClientRejected { .. })));
}

#[tokio::test]
async fn bad_client_credentials_are_a_configuration_error() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Invalid client\"}");
		})
		.await;
	let err = exchanger.exchange("abc123").await.expect_err("Exchange should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Config(ConfigError::ClientRejected { .. })));
	assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(503).header("content-type", "text/plain").body("upstream unavailable");
		})
		.await;
	let err = exchanger.exchange("abc123").await.expect_err("Exchange should fail.");

	mock.assert_calls_async(3).await;

	assert!(matches!(err, Error::Network(NetworkError::TokenEndpoint { status: Some(503), .. })));
	assert_eq!(exchanger.metrics.attempts(), 1);
	assert_eq!(exchanger.metrics.retries(), 2);
	assert_eq!(exchanger.metrics.failures(), 1);
}

#[tokio::test]
async fn malformed_success_body_is_not_retried() {
	let server = MockServer::start_async().await;
	let exchanger = build_exchanger(&server, ClientAuthMethod::ClientSecretBasic);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"unexpected\":true}");
		})
		.await;
	let err = exchanger.exchange("abc123").await.expect_err("Exchange should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Network(NetworkError::ResponseParse { status: Some(200), .. })));
}
