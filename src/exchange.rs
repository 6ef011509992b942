//! Authorization-code exchange with a per-call deadline and bounded retries.
//!
//! [`TokenExchanger`] owns the transport, the provider descriptor, and the client configuration.
//! Each call to [`TokenExchanger::exchange`] validates the configuration, posts
//! `grant_type=authorization_code` to the token endpoint, and retries only network failures.
//! A bundle is assembled only from a complete response, so dropping the future mid-flight leaves
//! nothing behind.

mod metrics;
mod retry;

pub use metrics::ExchangeMetrics;
pub use retry::RetryPolicy;

// self
use crate::{
	_prelude::*,
	auth::TokenBundle,
	config::ClientConfig,
	error::NetworkError,
	http::TokenHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Boxed future returned by [`CodeExchange::exchange_code`].
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenBundle>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Exchanger specialized for the crate's default reqwest transport stack.
pub type ReqwestExchanger = TokenExchanger<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Object-safe view of a code exchanger, so callers can swap in stubs.
pub trait CodeExchange
where
	Self: Send + Sync,
{
	/// Trades `code` for a token bundle.
	fn exchange_code<'a>(&'a self, code: &'a str) -> ExchangeFuture<'a>;
}

/// Performs authorization-code exchanges against one provider with one client registration.
#[derive(Clone)]
pub struct TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines the token endpoint and client auth method.
	pub descriptor: ProviderDescriptor,
	/// Strategy that classifies token endpoint errors.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Client id, secret, and redirect URI used for every exchange.
	pub config: ClientConfig,
	/// Retry schedule for network failures.
	pub retry: RetryPolicy,
	/// Shared counters for exchange outcomes.
	pub metrics: Arc<ExchangeMetrics>,
}
impl<C, M> TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an exchanger that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy: Arc::new(DefaultProviderStrategy),
			config,
			retry: RetryPolicy::default(),
			metrics: Default::default(),
		}
	}

	/// Replaces the error classification strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Replaces the retry schedule.
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Exchanges `code` for a token bundle.
	///
	/// Configuration problems fail before any request is sent. Provider rejections of the code
	/// surface as [`Error::InvalidGrant`], credential or redirect rejections as [`Error::Config`],
	/// and network failures are retried per [`RetryPolicy`] before surfacing as
	/// [`Error::Network`].
	pub async fn exchange(&self, code: &str) -> Result<TokenBundle> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.exchange_with_retry(code)).await;

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		obs::record_result(KIND, &result);

		result
	}

	async fn exchange_with_retry(&self, code: &str) -> Result<TokenBundle> {
		let client_id = self.config.client_id()?;
		let client_secret = self.config.client_secret()?;
		let redirect_uri = self.config.redirect_uri()?;
		let timeout = self.retry.attempt_timeout_std()?;
		let facade = <BasicFacade<C, M>>::from_descriptor(
			&self.descriptor,
			client_id,
			client_secret,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;
		let max_attempts = self.retry.max_attempts.max(1);
		let mut backoff = self.retry.initial_backoff;
		let mut attempt = 1;

		loop {
			let call =
				facade.exchange_authorization_code(self.strategy.as_ref(), code, redirect_uri);
			let err = match tokio::time::timeout(timeout, call).await {
				Ok(Ok(bundle)) => return Ok(bundle),
				Ok(Err(err)) => err,
				Err(_) => NetworkError::Timeout.into(),
			};

			if !err.is_retryable() || attempt >= max_attempts {
				return Err(err);
			}

			let delay = self.retry.delay(backoff, &err);

			obs::record_retry(FlowKind::Exchange, attempt, delay, &err);
			self.metrics.record_retry();

			if let Ok(pause) = std::time::Duration::try_from(delay) {
				tokio::time::sleep(pause).await;
			}

			backoff = self.retry.next_backoff(backoff);
			attempt += 1;
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchanger<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an exchanger with its own reqwest transport.
	///
	/// The transport never follows redirects and enforces the default per-call timeout.
	pub fn new(descriptor: ProviderDescriptor, config: ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(RetryPolicy::default().attempt_timeout)?;

		Ok(Self::with_http_client(
			descriptor,
			config,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Creates an exchanger for the Spotify Accounts service.
	pub fn spotify(config: ClientConfig) -> Result<Self> {
		let descriptor =
			ProviderDescriptor::spotify().map_err(crate::error::ConfigError::from)?;

		Self::new(descriptor, config)
	}
}
impl<C, M> CodeExchange for TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_code<'a>(&'a self, code: &'a str) -> ExchangeFuture<'a> {
		Box::pin(self.exchange(code))
	}
}
impl<C, M> Debug for TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchanger")
			.field("descriptor", &self.descriptor.id)
			.field("client_id", &self.config.client_id)
			.field("retry", &self.retry)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::error::ConfigError;

	fn exchanger(config: ClientConfig) -> ReqwestExchanger {
		TokenExchanger::spotify(config).expect("Spotify exchanger should build.")
	}

	#[tokio::test]
	async fn configuration_is_checked_before_any_request() {
		let no_secret = exchanger(ClientConfig::new("X", "http://localhost:8888"));
		let no_redirect = exchanger(ClientConfig {
			redirect_uri: None,
			..ClientConfig::new("X", "").with_client_secret("s")
		});

		assert!(matches!(
			no_secret.exchange("code").await,
			Err(Error::Config(ConfigError::MissingClientSecret))
		));
		assert!(matches!(
			no_redirect.exchange("code").await,
			Err(Error::Config(ConfigError::MissingRedirectUri))
		));
		assert_eq!(no_secret.metrics.attempts(), 1);
		assert_eq!(no_secret.metrics.failures(), 1);
		assert_eq!(no_secret.metrics.retries(), 0);
	}

	#[tokio::test]
	async fn zero_timeout_is_rejected() {
		let exchanger = exchanger(
			ClientConfig::new("X", "http://localhost:8888").with_client_secret("s"),
		)
		.with_retry_policy(RetryPolicy::default().with_attempt_timeout(Duration::ZERO));

		assert!(matches!(
			exchanger.exchange("code").await,
			Err(Error::Config(ConfigError::NonPositiveTimeout))
		));
	}

	#[test]
	fn debug_omits_secrets() {
		let exchanger = exchanger(
			ClientConfig::new("X", "http://localhost:8888").with_client_secret("hunter2"),
		);

		assert!(!format!("{exchanger:?}").contains("hunter2"));
	}
}
