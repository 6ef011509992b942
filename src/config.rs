//! Static client configuration shared by the URL builder and the token exchanger.
//!
//! Values are optional on purpose: a missing client id or redirect URI is not an error until an
//! operation needs it, at which point it surfaces as [`ConfigError`].

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	error::ConfigError,
};

/// Environment variable holding the client identifier.
pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
/// Environment variable holding the registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";
/// Environment variable holding a comma- or space-separated scope list.
pub const ENV_SCOPES: &str = "SPOTIFY_SCOPES";
/// Environment variable holding a static anti-forgery `state` value.
pub const ENV_STATE: &str = "SPOTIFY_AUTH_STATE";

/// Scopes requested when none are configured: playback, queue, library, and playlist access.
pub const DEFAULT_SPOTIFY_SCOPES: &[&str] = &[
	"user-read-currently-playing",
	"user-read-playback-state",
	"user-modify-playback-state",
	"app-remote-control",
	"streaming",
	"playlist-read-private",
	"playlist-read-collaborative",
	"playlist-modify-private",
	"playlist-modify-public",
	"user-read-playback-position",
	"user-top-read",
	"user-read-recently-played",
	"user-library-modify",
	"user-library-read",
];

/// OAuth client settings for the authorization-code flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret used at the token endpoint.
	pub client_secret: Option<Secret>,
	/// Redirect URI registered with the provider; the Redirect Receiver's public address.
	pub redirect_uri: Option<String>,
	/// Requested scopes.
	pub scopes: ScopeSet,
	/// Optional anti-forgery `state` value appended to the authorize URL.
	pub state: Option<String>,
	/// Forces the provider to show the consent dialog even for returning users.
	pub show_dialog: bool,
}
impl ClientConfig {
	/// Creates a configuration with the given client id and redirect URI.
	pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
		Self {
			client_id: Some(client_id.into()),
			redirect_uri: Some(redirect_uri.into()),
			..Self::default()
		}
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`; blank values count as absent.
	///
	/// Falls back to [`DEFAULT_SPOTIFY_SCOPES`] when no scopes are configured.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| {
			lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let scopes = read(ENV_SCOPES).map(|raw| ScopeSet::parse_list(&raw)).unwrap_or_default();

		Self {
			client_id: read(ENV_CLIENT_ID),
			client_secret: read(ENV_CLIENT_SECRET).map(Secret::from),
			redirect_uri: read(ENV_REDIRECT_URI),
			scopes,
			state: read(ENV_STATE),
			show_dialog: false,
		}
		.with_default_scopes()
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(secret));

		self
	}

	/// Replaces the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets the anti-forgery `state` value.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Toggles `show_dialog`.
	pub fn with_show_dialog(mut self, show_dialog: bool) -> Self {
		self.show_dialog = show_dialog;

		self
	}

	/// Applies [`DEFAULT_SPOTIFY_SCOPES`] if the scope list is empty.
	pub fn with_default_scopes(mut self) -> Self {
		if self.scopes.is_empty() {
			self.scopes = ScopeSet::parse_list(&DEFAULT_SPOTIFY_SCOPES.join(" "));
		}

		self
	}

	/// Returns the validated client identifier.
	pub fn client_id(&self) -> Result<&str, ConfigError> {
		let client_id = self.client_id.as_deref().ok_or(ConfigError::MissingClientId)?;

		if client_id.is_empty() || client_id.chars().any(char::is_whitespace) {
			return Err(ConfigError::InvalidClientId);
		}

		Ok(client_id)
	}

	/// Returns the redirect URI exactly as configured, after checking that it parses.
	///
	/// Providers compare redirect URIs as strings, so this value (not the normalized
	/// [`ClientConfig::redirect_url`]) is what goes on the wire.
	pub fn redirect_uri(&self) -> Result<&str, ConfigError> {
		let raw = self.redirect_uri.as_deref().ok_or(ConfigError::MissingRedirectUri)?;

		if raw.trim().is_empty() {
			return Err(ConfigError::MissingRedirectUri);
		}

		Url::parse(raw).map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(raw)
	}

	/// Returns the parsed redirect URI.
	pub fn redirect_url(&self) -> Result<Url, ConfigError> {
		Url::parse(self.redirect_uri()?).map_err(|source| ConfigError::InvalidRedirect { source })
	}

	/// Returns the client secret required for the token endpoint.
	pub fn client_secret(&self) -> Result<&Secret, ConfigError> {
		self.client_secret
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::MissingClientSecret)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		move |key| map.get(key).cloned()
	}

	#[test]
	fn lookup_reads_every_field() {
		let config = ClientConfig::from_lookup(lookup(&[
			(ENV_CLIENT_ID, "client-123"),
			(ENV_CLIENT_SECRET, "secret-456"),
			(ENV_REDIRECT_URI, " https://relay.example.com/callback "),
			(ENV_SCOPES, "streaming,user-top-read"),
			(ENV_STATE, "xyz"),
		]));

		assert_eq!(config.client_id().expect("Client id should be valid."), "client-123");
		assert_eq!(
			config.client_secret().expect("Client secret should be present.").expose(),
			"secret-456"
		);
		assert_eq!(
			config.redirect_url().expect("Redirect URI should parse.").as_str(),
			"https://relay.example.com/callback"
		);
		assert_eq!(config.scopes.iter().collect::<Vec<_>>(), vec!["streaming", "user-top-read"]);
		assert_eq!(config.state.as_deref(), Some("xyz"));
	}

	#[test]
	fn blank_values_count_as_absent_and_scopes_default() {
		let config = ClientConfig::from_lookup(lookup(&[(ENV_CLIENT_ID, "  ")]));

		assert!(matches!(config.client_id(), Err(ConfigError::MissingClientId)));
		assert!(matches!(config.redirect_url(), Err(ConfigError::MissingRedirectUri)));
		assert!(matches!(config.client_secret(), Err(ConfigError::MissingClientSecret)));
		assert_eq!(config.scopes.len(), DEFAULT_SPOTIFY_SCOPES.len());
	}

	#[test]
	fn malformed_values_are_reported() {
		let config = ClientConfig::new("has space", "not a url");

		assert!(matches!(config.client_id(), Err(ConfigError::InvalidClientId)));
		assert!(matches!(config.redirect_url(), Err(ConfigError::InvalidRedirect { .. })));
	}

	#[test]
	fn redirect_uri_is_kept_verbatim() {
		let config = ClientConfig::new("X", "http://localhost:8888");

		assert_eq!(
			config.redirect_uri().expect("Redirect URI should validate."),
			"http://localhost:8888"
		);
		assert_eq!(
			config.redirect_url().expect("Redirect URI should parse.").as_str(),
			"http://localhost:8888/"
		);
		assert!(matches!(
			ClientConfig::new("X", "not a url").redirect_uri(),
			Err(ConfigError::InvalidRedirect { .. })
		));
	}

	#[test]
	fn config_deserializes_from_json() {
		let config: ClientConfig = serde_json::from_str(
			r#"{"client_id":"abc","redirect_uri":"http://localhost:8888","scopes":["streaming"]}"#,
		)
		.expect("Config JSON should deserialize.");

		assert_eq!(config.client_id.as_deref(), Some("abc"));
		assert!(config.scopes.contains("streaming"));
		assert!(!config.show_dialog);
	}
}
