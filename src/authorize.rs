//! Authorize URL construction.

// self
use crate::{_prelude::*, config::ClientConfig, provider::ProviderDescriptor};

/// Builds the provider authorize URL for `config`.
///
/// The query carries `client_id`, `response_type=code`, `redirect_uri`, the delimited `scope`
/// list (omitted when empty), `state` (when configured), and `show_dialog=true` (when enabled).
/// Any query already present on the descriptor's authorize endpoint is kept.
pub fn build_authorize_url(descriptor: &ProviderDescriptor, config: &ClientConfig) -> Result<Url> {
	let client_id = config.client_id()?;
	let redirect_uri = config.redirect_uri()?;
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", client_id);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("redirect_uri", redirect_uri);

	if let Some(scope) = config.scopes.joined(descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope);
	}
	if let Some(state) = config.state.as_deref().filter(|state| !state.is_empty()) {
		pairs.append_pair("state", state);
	}
	if config.show_dialog {
		pairs.append_pair("show_dialog", "true");
	}

	drop(pairs);

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ScopeSet, error::ConfigError};

	fn spotify() -> ProviderDescriptor {
		ProviderDescriptor::spotify().expect("Spotify preset should validate.")
	}

	fn query(url: &Url) -> Vec<(String, String)> {
		url.query_pairs().into_owned().collect()
	}

	#[test]
	fn query_follows_documented_order() {
		let config = ClientConfig::new("X", "http://localhost:8888")
			.with_scopes(
				ScopeSet::new(["user-read-playback-state", "streaming"])
					.expect("Scope fixture should be valid."),
			)
			.with_state("s-1");
		let url = build_authorize_url(&spotify(), &config).expect("URL should build.");
		let keys: Vec<String> = query(&url).into_iter().map(|(key, _)| key).collect();

		assert_eq!(url.path(), "/authorize");
		assert_eq!(keys, vec!["client_id", "response_type", "redirect_uri", "scope", "state"]);
		assert!(
			query(&url)
				.contains(&("scope".into(), "user-read-playback-state streaming".into()))
		);
	}

	#[test]
	fn optional_parameters_are_omitted() {
		let config = ClientConfig::new("X", "http://localhost:8888");
		let url = build_authorize_url(&spotify(), &config).expect("URL should build.");
		let pairs = query(&url);

		assert!(!pairs.iter().any(|(key, _)| key == "scope" || key == "state"));
		assert!(!pairs.iter().any(|(key, _)| key == "show_dialog"));

		let url = build_authorize_url(&spotify(), &config.with_show_dialog(true))
			.expect("URL should build.");

		assert!(query(&url).contains(&("show_dialog".into(), "true".into())));
	}

	#[test]
	fn missing_or_malformed_inputs_fail_with_configuration_errors() {
		let missing_id =
			ClientConfig { client_id: None, ..ClientConfig::new("X", "http://localhost") };
		let bad_redirect = ClientConfig::new("X", "::not-a-uri::");

		assert!(matches!(
			build_authorize_url(&spotify(), &missing_id),
			Err(Error::Config(ConfigError::MissingClientId))
		));
		assert!(matches!(
			build_authorize_url(&spotify(), &bad_redirect),
			Err(Error::Config(ConfigError::InvalidRedirect { .. }))
		));
	}
}
