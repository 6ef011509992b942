//! Optional observability helpers for relay and exchange flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `spotify_auth_relay.flow` with the `flow` and `stage`
//!   fields, plus a warning event for every retried exchange attempt.
//! - Enable `metrics` to increment `spotify_auth_relay_flow_total` (labeled by `flow` +
//!   `outcome`) and `spotify_auth_relay_retry_total` (labeled by `flow`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorize URL construction.
	AuthorizeUrl,
	/// Relay deposit.
	Deposit,
	/// Relay one-time retrieval.
	Retrieve,
	/// Relay expiry sweep or teardown.
	Purge,
	/// Authorization-code exchange.
	Exchange,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizeUrl => "authorize_url",
			FlowKind::Deposit => "deposit",
			FlowKind::Retrieve => "retrieve",
			FlowKind::Purge => "purge",
			FlowKind::Exchange => "exchange",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of `result` for `kind`.
pub(crate) fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
