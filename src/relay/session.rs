//! Pending authorization handoffs keyed by a short numeric id.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, auth::Secret};

/// Fixed validity window for every pending session.
pub const SESSION_TTL: Duration = Duration::hours(24);

/// Six-digit identifier a person can read off a page and type into a chat.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SessionId(u32);
impl SessionId {
	/// Smallest valid id.
	pub const MIN: u32 = 100_000;
	/// Largest valid id.
	pub const MAX: u32 = 999_999;

	/// Wraps `value` if it lies within the six-digit range.
	pub fn new(value: u32) -> Result<Self, SessionIdError> {
		if (Self::MIN..=Self::MAX).contains(&value) {
			Ok(Self(value))
		} else {
			Err(SessionIdError::OutOfRange)
		}
	}

	/// Draws a uniformly random id from the thread-local generator.
	pub fn random() -> Self {
		Self(rand::rng().random_range(Self::MIN..=Self::MAX))
	}

	/// Returns the numeric value.
	pub fn get(self) -> u32 {
		self.0
	}
}
impl Debug for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SessionId({})", self.0)
	}
}
impl Display for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}
impl FromStr for SessionId {
	type Err = SessionIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();

		if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
			return Err(SessionIdError::NotNumeric);
		}

		if trimmed.len() != 6 {
			return Err(SessionIdError::OutOfRange);
		}

		let value = trimmed.parse::<u32>().map_err(|_| SessionIdError::OutOfRange)?;

		Self::new(value)
	}
}
impl TryFrom<u32> for SessionId {
	type Error = SessionIdError;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<SessionId> for u32 {
	fn from(value: SessionId) -> Self {
		value.0
	}
}

/// Error returned when a user-typed id cannot be a session id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum SessionIdError {
	/// The value contains something other than ASCII digits.
	#[error("Session id must be numeric.")]
	NotNumeric,
	/// The value is not a six-digit number.
	#[error("Session id must have six digits.")]
	OutOfRange,
}

/// One pending authorization code awaiting a single retrieval.
///
/// Fields are private: a session is created once by a deposit and then only read or dropped.
#[derive(Clone)]
pub struct AuthSession {
	id: SessionId,
	code: Secret,
	created_at: OffsetDateTime,
}
impl AuthSession {
	/// Creates a session for `code` deposited at `created_at`.
	pub fn new(id: SessionId, code: Secret, created_at: OffsetDateTime) -> Self {
		Self { id, code, created_at }
	}

	/// Session identifier.
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Deposit instant.
	pub fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}

	/// Instant after which the session can no longer be retrieved.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.created_at + SESSION_TTL
	}

	/// Returns `true` once the session's age reaches [`SESSION_TTL`].
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now - self.created_at >= SESSION_TTL
	}

	/// Consumes the session, yielding the code.
	pub fn into_code(self) -> Secret {
		self.code
	}
}
impl Debug for AuthSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession")
			.field("id", &self.id)
			.field("code", &self.code)
			.field("created_at", &self.created_at)
			.finish()
	}
}
