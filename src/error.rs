//! Relay-wide error taxonomy shared by the URL builder, relay store, exchanger, and façade.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced to callers of every public operation.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Static misconfiguration; fatal to the operation and never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Relay lookup miss.
	///
	/// Unknown ids, already-delivered sessions, and expired sessions all collapse into this
	/// variant so callers cannot tell them apart.
	#[error("No pending authorization matches the supplied id.")]
	NotFound,
	/// Provider rejected the authorization code (unknown, expired, or already used).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Transport or upstream failure while calling the token endpoint.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Relay backend failure unrelated to whether an id exists.
	#[error("Relay backend failed.")]
	Storage(
		#[from]
		#[source]
		crate::relay::StoreError,
	),
}
impl Error {
	/// Returns `true` when the exchanger may retry the failed call.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Network(err) if err.is_retryable())
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No client identifier was configured.
	#[error("Client identifier is missing.")]
	MissingClientId,
	/// The client identifier is empty or contains whitespace.
	#[error("Client identifier is malformed.")]
	InvalidClientId,
	/// No client secret was configured for a confidential client.
	#[error("Client secret is missing.")]
	MissingClientSecret,
	/// No redirect URI was configured.
	#[error("Redirect URI is missing.")]
	MissingRedirectUri,
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A requested scope entry is invalid.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider rejected the client credentials or the redirect URI.
	#[error("Provider rejected the client configuration: {reason}.")]
	ClientRejected {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// A configured timeout is zero or negative.
	#[error("Timeouts must be positive.")]
	NonPositiveTimeout,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level and upstream failures observed while calling the token endpoint.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Provider answered with a temporary failure (5xx, 429, or an empty error body).
	#[error("Token endpoint returned a temporary failure: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// A single exchange attempt exceeded its deadline.
	#[error("Token endpoint call timed out.")]
	Timeout,
	/// Underlying HTTP client reported a connection failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Token endpoint answered successfully but the body is not a token response.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl NetworkError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns `true` for failures that may succeed on a later attempt.
	///
	/// A malformed success body is final: the provider has likely consumed the code already.
	pub fn is_retryable(&self) -> bool {
		!matches!(self, Self::ResponseParse { .. })
	}

	/// Upstream Retry-After hint, if the provider sent one.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::TokenEndpoint { retry_after, .. } => *retry_after,
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for NetworkError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::relay::StoreError;

	#[test]
	fn only_network_failures_are_retryable() {
		let transient = Error::from(NetworkError::TokenEndpoint {
			message: "bad gateway".into(),
			status: Some(502),
			retry_after: None,
		});

		assert!(transient.is_retryable());
		assert!(Error::from(NetworkError::Timeout).is_retryable());
		assert!(!Error::InvalidGrant { reason: "used".into() }.is_retryable());
		assert!(!Error::from(ConfigError::MissingClientId).is_retryable());
		assert!(!Error::NotFound.is_retryable());
	}

	#[test]
	fn not_found_message_carries_no_cause() {
		assert_eq!(
			Error::NotFound.to_string(),
			"No pending authorization matches the supplied id."
		);
		assert!(StdError::source(&Error::NotFound).is_none());
	}

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "cache unreachable".into() };
		let err: Error = store_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert_eq!(err.to_string(), "Relay backend failed.");
		assert!(!err.to_string().contains("cache unreachable"));

		let source =
			StdError::source(&err).expect("Storage errors should expose the backend error.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
