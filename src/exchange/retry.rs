// self
use crate::{_prelude::*, error::ConfigError};

/// Bounded retry schedule for network failures during the code exchange.
///
/// Only [`Error::is_retryable`] failures are retried. The delay before retry `n` is the current
/// backoff (doubling from `initial_backoff`), raised to the provider's `Retry-After` hint when one
/// is present, and capped at `max_backoff`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Total number of token endpoint calls, first one included.
	pub max_attempts: u32,
	/// Delay before the first retry.
	pub initial_backoff: Duration,
	/// Upper bound for any single delay.
	pub max_backoff: Duration,
	/// Deadline for each individual token endpoint call.
	pub attempt_timeout: Duration,
}
impl RetryPolicy {
	/// Policy that performs exactly one call.
	pub fn no_retry() -> Self {
		Self { max_attempts: 1, ..Self::default() }
	}

	/// Sets the total number of calls; zero is treated as one.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts.max(1);

		self
	}

	/// Sets the initial and maximum backoff.
	pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
		self.initial_backoff = initial;
		self.max_backoff = max;

		self
	}

	/// Sets the per-call deadline.
	pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
		self.attempt_timeout = timeout;

		self
	}

	pub(crate) fn attempt_timeout_std(&self) -> Result<std::time::Duration, ConfigError> {
		if !self.attempt_timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		std::time::Duration::try_from(self.attempt_timeout)
			.map_err(|_| ConfigError::NonPositiveTimeout)
	}

	pub(crate) fn delay(&self, backoff: Duration, error: &Error) -> Duration {
		let hinted = match error {
			Error::Network(err) => err.retry_after(),
			_ => None,
		};
		let delay = hinted.map_or(backoff, |hint| hint.max(backoff));

		delay.min(self.max_backoff).max(Duration::ZERO)
	}

	pub(crate) fn next_backoff(&self, backoff: Duration) -> Duration {
		backoff.saturating_mul(2).min(self.max_backoff)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff: Duration::milliseconds(200),
			max_backoff: Duration::seconds(2),
			attempt_timeout: Duration::seconds(10),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::NetworkError;

	fn endpoint_error(retry_after: Option<Duration>) -> Error {
		NetworkError::TokenEndpoint { message: "busy".into(), status: Some(503), retry_after }
			.into()
	}

	#[test]
	fn backoff_doubles_up_to_the_cap() {
		let policy = RetryPolicy::default();
		let second = policy.next_backoff(policy.initial_backoff);
		let capped = policy.next_backoff(Duration::milliseconds(1_500));

		assert_eq!(second, Duration::milliseconds(400));
		assert_eq!(capped, Duration::seconds(2));
		assert_eq!(policy.next_backoff(Duration::MAX), policy.max_backoff);
	}

	#[test]
	fn retry_after_raises_but_never_exceeds_cap() {
		let policy = RetryPolicy::default();
		let backoff = Duration::milliseconds(200);

		assert_eq!(policy.delay(backoff, &endpoint_error(None)), backoff);
		assert_eq!(
			policy.delay(backoff, &endpoint_error(Some(Duration::seconds(1)))),
			Duration::seconds(1)
		);
		assert_eq!(
			policy.delay(backoff, &endpoint_error(Some(Duration::seconds(60)))),
			Duration::seconds(2)
		);
	}

	#[test]
	fn timeout_must_be_positive() {
		assert_eq!(
			RetryPolicy::default().attempt_timeout_std().ok(),
			Some(std::time::Duration::from_secs(10))
		);
		assert!(
			RetryPolicy::default()
				.with_attempt_timeout(Duration::ZERO)
				.attempt_timeout_std()
				.is_err()
		);
		assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
	}
}
