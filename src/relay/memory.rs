//! Thread-safe in-memory [`RelayStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	relay::{AuthSession, RelayFuture, RelayStore, SessionId, StoreError},
};

type SessionMap = Arc<Mutex<HashMap<SessionId, AuthSession>>>;
type IdSource = Arc<dyn Fn() -> SessionId + Send + Sync>;

/// Relay store that keeps pending sessions in a process-local table behind one lock.
///
/// Each deposit first sweeps expired sessions, then draws ids until it finds one no pending
/// session holds, all under the same guard.
#[derive(Clone)]
pub struct MemoryRelayStore {
	sessions: SessionMap,
	id_source: IdSource,
}
impl MemoryRelayStore {
	/// Maximum number of ids drawn per deposit before reporting exhaustion.
	pub const MAX_ID_ATTEMPTS: u32 = 64;

	/// Creates an empty store drawing ids from `id_source` instead of the random generator.
	pub fn with_id_source<F>(id_source: F) -> Self
	where
		F: 'static + Fn() -> SessionId + Send + Sync,
	{
		Self { sessions: Default::default(), id_source: Arc::new(id_source) }
	}

	/// Number of sessions currently held, expired ones included.
	pub fn len(&self) -> usize {
		self.sessions.lock().len()
	}

	/// Returns `true` when no session is held.
	pub fn is_empty(&self) -> bool {
		self.sessions.lock().is_empty()
	}

	fn deposit_now(&self, code: Secret, now: OffsetDateTime) -> Result<SessionId, StoreError> {
		let mut guard = self.sessions.lock();

		guard.retain(|_, session| !session.is_expired_at(now));

		for _ in 0..Self::MAX_ID_ATTEMPTS {
			let id = (self.id_source)();

			if guard.contains_key(&id) {
				continue;
			}

			guard.insert(id, AuthSession::new(id, code, now));

			return Ok(id);
		}

		Err(StoreError::IdSpaceExhausted { attempts: Self::MAX_ID_ATTEMPTS })
	}

	fn retrieve_now(&self, id: SessionId, now: OffsetDateTime) -> Option<Secret> {
		let session = self.sessions.lock().remove(&id)?;

		if session.is_expired_at(now) { None } else { Some(session.into_code()) }
	}

	fn purge_now(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.sessions.lock();
		let before = guard.len();

		guard.retain(|_, session| !session.is_expired_at(now));

		before - guard.len()
	}

	fn clear_now(&self) -> usize {
		self.sessions.lock().drain().count()
	}
}
impl Default for MemoryRelayStore {
	fn default() -> Self {
		Self::with_id_source(SessionId::random)
	}
}
impl Debug for MemoryRelayStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryRelayStore").field("pending", &self.len()).finish()
	}
}
impl RelayStore for MemoryRelayStore {
	fn deposit(&self, code: Secret, now: OffsetDateTime) -> RelayFuture<'_, SessionId> {
		Box::pin(async move { self.deposit_now(code, now) })
	}

	fn retrieve(&self, id: SessionId, now: OffsetDateTime) -> RelayFuture<'_, Option<Secret>> {
		Box::pin(async move { Ok(self.retrieve_now(id, now)) })
	}

	fn purge(&self, now: OffsetDateTime) -> RelayFuture<'_, usize> {
		Box::pin(async move { Ok(self.purge_now(now)) })
	}

	fn clear(&self) -> RelayFuture<'_, usize> {
		Box::pin(async move { Ok(self.clear_now()) })
	}
}
