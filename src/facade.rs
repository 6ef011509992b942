//! Agent-facing operations: fetch the authorize URL and trade a relayed code for tokens.
//!
//! [`AuthFacade::dispatch`] accepts the JSON tool call an agent sends (`{"action":"get_url"}` or
//! `{"action":"handle_callback","code":"..."}`) and returns a reply that serializes to the JSON
//! the agent reads back.

// self
use crate::{
	_prelude::*,
	auth::{TokenBundle, TokenPayload},
	authorize,
	config::ClientConfig,
	exchange::CodeExchange,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

/// Successful `get_url` reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationUrl {
	/// Fully formed authorize URL.
	pub url: Url,
}

/// Tool call accepted by [`AuthFacade::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthRequest {
	/// Return the authorize URL.
	GetUrl,
	/// Exchange an authorization code.
	HandleCallback {
		/// Code the Redirect Receiver resolved from the user's id.
		#[serde(default)]
		code: String,
	},
}

/// Reply produced by [`AuthFacade::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthReply {
	/// `{ "url": ... }`
	Url {
		/// Authorize URL.
		url: Url,
	},
	/// `{ "access_token", "refresh_token"?, "expires_in" }`
	Tokens(TokenPayload),
}
impl AuthReply {
	/// Serializes the reply to the JSON text handed to the agent.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}

/// The two operations exposed to the calling agent.
///
/// The façade never looks up relay ids; callers pass the code the Redirect Receiver resolved.
#[derive(Clone)]
pub struct AuthFacade {
	descriptor: ProviderDescriptor,
	config: ClientConfig,
	exchanger: Arc<dyn CodeExchange>,
}
impl AuthFacade {
	/// Creates a façade over `exchanger` using `config` for the authorize URL.
	pub fn new(
		descriptor: ProviderDescriptor,
		config: ClientConfig,
		exchanger: Arc<dyn CodeExchange>,
	) -> Self {
		Self { descriptor, config, exchanger }
	}

	/// Creates a Spotify façade with the default reqwest exchanger.
	#[cfg(feature = "reqwest")]
	pub fn spotify(config: ClientConfig) -> Result<Self> {
		let descriptor =
			ProviderDescriptor::spotify().map_err(crate::error::ConfigError::from)?;
		let exchanger =
			crate::exchange::ReqwestExchanger::new(descriptor.clone(), config.clone())?;

		Ok(Self::new(descriptor, config, Arc::new(exchanger)))
	}

	/// Client configuration used for the authorize URL.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the authorize URL; fails only with [`Error::Config`].
	pub fn get_url(&self) -> Result<AuthorizationUrl> {
		const KIND: FlowKind = FlowKind::AuthorizeUrl;

		let span = FlowSpan::new(KIND, "get_url");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.in_scope(|| {
			authorize::build_authorize_url(&self.descriptor, &self.config)
				.map(|url| AuthorizationUrl { url })
		});

		obs::record_result(KIND, &result);

		result
	}

	/// Forwards `code` to the exchanger and returns its bundle or error unchanged.
	///
	/// A blank code is rejected as [`Error::InvalidGrant`] without contacting the provider.
	pub async fn handle_callback(&self, code: &str) -> Result<TokenBundle> {
		if code.trim().is_empty() {
			return Err(Error::InvalidGrant { reason: "Authorization code is required.".into() });
		}

		self.exchanger.exchange_code(code).await
	}

	/// Runs a tool call.
	pub async fn dispatch(&self, request: AuthRequest) -> Result<AuthReply> {
		match request {
			AuthRequest::GetUrl => self.get_url().map(|reply| AuthReply::Url { url: reply.url }),
			AuthRequest::HandleCallback { code } => self
				.handle_callback(&code)
				.await
				.map(|bundle| AuthReply::Tokens(bundle.to_payload())),
		}
	}
}
impl Debug for AuthFacade {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthFacade")
			.field("descriptor", &self.descriptor.id)
			.field("client_id", &self.config.client_id)
			.finish()
	}
}
