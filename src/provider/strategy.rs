//! Provider strategy hooks that classify token endpoint failures.
//!
//! Implementations work on crate-owned context data so flows never depend on a particular HTTP
//! client when deciding whether a failure is the caller's code, the caller's configuration, or a
//! temporary upstream problem.

// self
use crate::_prelude::*;

/// Strategy hook that classifies token endpoint errors.
pub trait ProviderStrategy: Send + Sync {
	/// Maps provider error details into the relay taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// The authorization code is unknown, expired, or already used.
	InvalidGrant,
	/// Client credentials or the redirect URI were rejected.
	Configuration,
	/// Temporary failure that may succeed on retry.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure() -> Self {
		Self { network_error: true, ..Self::default() }
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth `error` code returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a truncated body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy tuned for the Spotify Accounts service and RFC 6749 providers.
///
/// Redirect-URI mismatches win first because Spotify reports them as `invalid_grant`. After that
/// the structured OAuth fields are consulted, then body hints, then the HTTP status. Network
/// failures are always transient.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}
		if ctx.error_description.as_deref().is_some_and(mentions_redirect) {
			return ProviderErrorKind::Configuration;
		}
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(match_error_code) {
			return kind;
		}
		if let Some(kind) = classify_text(ctx.error_description.as_deref())
			.or_else(|| classify_text(ctx.body_preview.as_deref()))
		{
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf: String = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}

fn mentions_redirect(text: &str) -> bool {
	let lowered = text.to_ascii_lowercase();

	lowered.contains("redirect uri") || lowered.contains("redirect_uri")
}

fn match_error_code(value: &str) -> Option<ProviderErrorKind> {
	match value.to_ascii_lowercase().as_str() {
		"invalid_grant" | "access_denied" => Some(ProviderErrorKind::InvalidGrant),
		"invalid_client" | "unauthorized_client" | "invalid_scope" | "unsupported_grant_type" =>
			Some(ProviderErrorKind::Configuration),
		"temporarily_unavailable" | "server_error" => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_text(text: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = text?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") || text.contains("authorization code") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") || mentions_redirect(text) =>
			Some(ProviderErrorKind::Configuration),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401 | 403) => ProviderErrorKind::Configuration,
		_ => ProviderErrorKind::Transient,
	}
}
