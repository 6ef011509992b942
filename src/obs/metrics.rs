// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"spotify_auth_relay_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a retried attempt and, with `tracing`, logs the scheduled delay.
pub fn record_retry(kind: FlowKind, attempt: u32, delay: Duration, error: &Error) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("spotify_auth_relay_retry_total", "flow" => kind.as_str()).increment(1);
	}
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			attempt,
			delay_ms = delay.whole_milliseconds() as u64,
			error = %error,
			"Retrying token endpoint call."
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, delay, error);
	}
	#[cfg(not(any(feature = "metrics", feature = "tracing")))]
	{
		let _ = kind;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_features() {
		record_flow_outcome(FlowKind::Retrieve, FlowOutcome::Failure);
		record_retry(FlowKind::Exchange, 1, Duration::milliseconds(200), &Error::NotFound);
	}
}
