//! Token bundle returned by a successful authorization-code exchange.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
};

/// Access/refresh token pair plus expiry returned by the token exchange.
///
/// Bundles are transient: nothing in this crate stores them after handing them to the caller.
#[derive(Clone)]
pub struct TokenBundle {
	/// Access token; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type reported by the provider (usually `Bearer`).
	pub token_type: String,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Lifetime reported by the provider.
	pub expires_in: Duration,
	/// Scopes the provider reports as granted, if it reported any.
	pub scope: Option<ScopeSet>,
	/// Instant the bundle was assembled.
	pub issued_at: OffsetDateTime,
}
impl TokenBundle {
	/// Absolute expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}

	/// Returns `true` if the access token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}

	/// Returns `true` if the access token has expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Projects the bundle into the shape handed back to the calling agent.
	pub fn to_payload(&self) -> TokenPayload {
		TokenPayload {
			access_token: self.access_token.expose().to_owned(),
			refresh_token: self.refresh_token.as_ref().map(|secret| secret.expose().to_owned()),
			expires_in: self.expires_in.whole_seconds(),
		}
	}
}
impl Debug for TokenBundle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBundle")
			.field("access_token", &self.access_token)
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token)
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

/// Wire shape of a successful `handle_callback`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Raw access token.
	pub access_token: String,
	/// Raw refresh token, if issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Lifetime in seconds.
	pub expires_in: i64,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn bundle(refresh: Option<&str>) -> TokenBundle {
		TokenBundle {
			access_token: Secret::new("access"),
			token_type: "Bearer".into(),
			refresh_token: refresh.map(Secret::from),
			expires_in: Duration::hours(1),
			scope: None,
			issued_at: datetime!(2026-01-01 12:00 UTC),
		}
	}

	#[test]
	fn expiry_is_exclusive_at_the_horizon() {
		let bundle = bundle(None);

		assert_eq!(bundle.expires_at(), datetime!(2026-01-01 13:00 UTC));
		assert!(!bundle.is_expired_at(datetime!(2026-01-01 12:59:59 UTC)));
		assert!(bundle.is_expired_at(datetime!(2026-01-01 13:00 UTC)));
	}

	#[test]
	fn payload_omits_missing_refresh_token() {
		let json = serde_json::to_string(&bundle(None).to_payload())
			.expect("Payload should serialize to JSON.");

		assert_eq!(json, "{\"access_token\":\"access\",\"expires_in\":3600}");

		let payload = bundle(Some("refresh")).to_payload();

		assert_eq!(payload.refresh_token.as_deref(), Some("refresh"));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let rendered = format!("{:?}", bundle(Some("refresh")));

		assert!(!rendered.contains("access\""));
		assert!(rendered.contains("<redacted>"));
	}
}
