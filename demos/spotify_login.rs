//! Walks the relay handoff end to end against a local mock of the Spotify token endpoint.
//!
//! 1. The agent asks the façade for the authorize URL and shows it to the person.
//! 2. Spotify redirects the browser to the Redirect Receiver with `?code=...`; the receiver parks
//!    the code and shows a six-digit id.
//! 3. The person types the id into the chat; the agent picks the code up with `?id=...`.
//! 4. The façade exchanges the code for tokens.
//!
//! Client settings come from `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`, and
//! `SPOTIFY_REDIRECT_URI` when set.

// std
use std::sync::Arc;
// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
// self
use spotify_auth_relay::{
	config::ClientConfig,
	exchange::ReqwestExchanger,
	facade::{AuthFacade, AuthRequest},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::ProviderDescriptor,
	relay::{ReceiverReply, RedirectReceiver, Relay},
	reqwest::{Client, redirect::Policy},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut config = ClientConfig::from_env();

	config.client_id.get_or_insert_with(|| "demo-client".into());
	config.redirect_uri.get_or_insert_with(|| "http://localhost:8888/callback".into());

	if config.client_secret.is_none() {
		config = config.with_client_secret("demo-secret");
	}

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token").form_urlencoded_tuple("code", "AQD-demo");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"demo-refresh\"}",
			);
		})
		.await;
	let spotify = ProviderDescriptor::spotify()?;
	let descriptor = ProviderDescriptor::builder("spotify-mock")
		.authorization_endpoint(spotify.endpoints.authorization.clone())
		.token_endpoint(Url::parse(&server.url("/api/token"))?)
		.build()?;
	// The mock serves a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let exchanger = ReqwestExchanger::with_http_client(
		descriptor.clone(),
		config.clone(),
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);
	let facade = AuthFacade::new(descriptor, config.clone(), Arc::new(exchanger));
	let reply = facade.dispatch(AuthRequest::GetUrl).await?;

	println!("get_url -> {}", reply.to_json()?);

	let redirect_uri = config.redirect_url()?;
	let receiver = RedirectReceiver::new(Relay::in_memory(redirect_uri.clone()));
	let mut redirect = redirect_uri;

	redirect.query_pairs_mut().append_pair("code", "AQD-demo");

	let ReceiverReply::Deposited { id, link } = receiver.handle_url(&redirect).await? else {
		return Err(eyre!("The receiver did not accept the redirect."));
	};

	println!("Redirect Receiver assigned session id {id} ({link}).");

	let ReceiverReply::Code(code) = receiver.handle_url(&link).await? else {
		return Err(eyre!("Session {id} was not pending."));
	};
	let reply = facade
		.dispatch(AuthRequest::HandleCallback { code: code.expose().to_owned() })
		.await?;

	token_mock.assert_async().await;

	println!("handle_callback -> {}", reply.to_json()?);
	println!(
		"A second pickup of {id} answers with status {}.",
		receiver.handle_url(&link).await?.status()
	);

	Ok(())
}
