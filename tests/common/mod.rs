#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use spotify_auth_relay::{
	config::ClientConfig,
	exchange::{ReqwestExchanger, RetryPolicy, TokenExchanger},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{ClientAuthMethod, ProviderDescriptor},
	reqwest::{Client, redirect::Policy},
	url::Url,
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const REDIRECT_URI: &str = "https://relay.example.com/callback";

pub fn build_descriptor(server: &MockServer, method: ClientAuthMethod) -> ProviderDescriptor {
	ProviderDescriptor::builder("mock-spotify")
		.authorization_endpoint(
			Url::parse(&server.url("/authorize"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url("/api/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.preferred_client_auth_method(method)
		.build()
		.expect("Provider descriptor should build successfully.")
}

pub fn build_config() -> ClientConfig {
	ClientConfig::new(CLIENT_ID, REDIRECT_URI).with_client_secret(CLIENT_SECRET)
}

/// Retry policy with millisecond backoff so retry tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy::default().with_max_attempts(max_attempts).with_backoff(
		time::Duration::milliseconds(5),
		time::Duration::milliseconds(20),
	)
}

/// Builds a reqwest transport that accepts the self-signed certificates `httpmock` serves.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.timeout(std::time::Duration::from_secs(5))
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Exchanger over the mock server using `config` and the test reqwest transport.
pub fn build_exchanger_with(
	server: &MockServer,
	method: ClientAuthMethod,
	config: ClientConfig,
) -> ReqwestExchanger {
	TokenExchanger::with_http_client(
		build_descriptor(server, method),
		config,
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_retry_policy(fast_retry(3))
}

/// Exchanger over the mock server with the shared client registration.
pub fn build_exchanger(server: &MockServer, method: ClientAuthMethod) -> ReqwestExchanger {
	build_exchanger_with(server, method, build_config())
}
