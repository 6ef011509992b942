//! Relay store contracts and the [`Relay`] handle that guards single-use authorization codes.
//!
//! A deposit parks a code behind a fresh six-digit [`SessionId`]; the first retrieval for that id
//! hands the code out and removes it. Unknown, delivered, and expired ids are indistinguishable to
//! callers: all of them surface as [`Error::NotFound`].

pub mod memory;
pub mod receiver;
pub mod session;

pub use memory::MemoryRelayStore;
pub use receiver::*;
pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::Secret,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Boxed future returned by [`RelayStore`] operations.
pub type RelayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Backend contract for pending authorization codes.
///
/// Implementations must make the id-collision check and the insertion in [`deposit`] atomic, and
/// must make the lookup and removal in [`retrieve`] atomic, so racing retrievals of one id yield
/// the code exactly once.
///
/// [`deposit`]: RelayStore::deposit
/// [`retrieve`]: RelayStore::retrieve
pub trait RelayStore
where
	Self: Send + Sync,
{
	/// Stores `code` under an id that no pending session currently holds.
	fn deposit(&self, code: Secret, now: OffsetDateTime) -> RelayFuture<'_, SessionId>;

	/// Removes and returns the code for `id` if the session is pending and younger than
	/// [`SESSION_TTL`] at `now`.
	fn retrieve(&self, id: SessionId, now: OffsetDateTime) -> RelayFuture<'_, Option<Secret>>;

	/// Drops every session whose age at `now` reached [`SESSION_TTL`], returning how many.
	fn purge(&self, now: OffsetDateTime) -> RelayFuture<'_, usize>;

	/// Drops every session, returning how many.
	fn clear(&self) -> RelayFuture<'_, usize>;
}

/// Error type produced by [`RelayStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// No free id was found after the bounded number of draws.
	#[error("No free session id after {attempts} attempts.")]
	IdSpaceExhausted {
		/// Number of ids drawn before giving up.
		attempts: u32,
	},
}

/// Result of a deposit: the id to show the user and the pickup link embedding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
	/// Assigned session id.
	pub id: SessionId,
	/// `{base_url}?id=<id>` link for the Redirect Receiver's page.
	pub link: Url,
}

/// Process-scoped handle over a [`RelayStore`].
///
/// Create one with [`Relay::new`] at startup, share it by cloning, and call [`Relay::teardown`] on
/// shutdown. All access to pending sessions goes through deposit, retrieve, and purge.
#[derive(Clone)]
pub struct Relay {
	store: Arc<dyn RelayStore>,
	base_url: Url,
}
impl Relay {
	/// Creates a relay over `store` whose pickup links point at `base_url`.
	pub fn new(store: Arc<dyn RelayStore>, base_url: Url) -> Self {
		Self { store, base_url }
	}

	/// Creates a relay backed by a fresh [`MemoryRelayStore`].
	pub fn in_memory(base_url: Url) -> Self {
		Self::new(Arc::new(MemoryRelayStore::default()), base_url)
	}

	/// Public address of the Redirect Receiver.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Builds the pickup link for `id`.
	pub fn link_for(&self, id: SessionId) -> Url {
		let mut link = self.base_url.clone();

		link.query_pairs_mut().append_pair("id", &id.to_string());

		link
	}

	/// Deposits `code` using the current clock.
	pub async fn deposit(&self, code: impl Into<Secret>) -> Result<DepositReceipt> {
		self.deposit_at(code, OffsetDateTime::now_utc()).await
	}

	/// Deposits `code` as if it arrived at `now`.
	pub async fn deposit_at(
		&self,
		code: impl Into<Secret>,
		now: OffsetDateTime,
	) -> Result<DepositReceipt> {
		let code = code.into();
		let span = FlowSpan::new(FlowKind::Deposit, "deposit");

		obs::record_flow_outcome(FlowKind::Deposit, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let id = self.store.deposit(code, now).await?;

				Ok(DepositReceipt { id, link: self.link_for(id) })
			})
			.await;

		obs::record_result(FlowKind::Deposit, &result);

		result
	}

	/// Retrieves the code for `id` using the current clock.
	pub async fn retrieve(&self, id: SessionId) -> Result<Secret> {
		self.retrieve_at(id, OffsetDateTime::now_utc()).await
	}

	/// Retrieves the code for `id` as of `now`; every miss is [`Error::NotFound`].
	pub async fn retrieve_at(&self, id: SessionId, now: OffsetDateTime) -> Result<Secret> {
		let span = FlowSpan::new(FlowKind::Retrieve, "retrieve");

		obs::record_flow_outcome(FlowKind::Retrieve, FlowOutcome::Attempt);

		let result = span
			.instrument(async move { self.store.retrieve(id, now).await?.ok_or(Error::NotFound) })
			.await;

		obs::record_result(FlowKind::Retrieve, &result);

		result
	}

	/// Drops expired sessions using the current clock.
	pub async fn purge(&self) -> Result<usize> {
		self.purge_at(OffsetDateTime::now_utc()).await
	}

	/// Drops sessions expired as of `now`.
	pub async fn purge_at(&self, now: OffsetDateTime) -> Result<usize> {
		let span = FlowSpan::new(FlowKind::Purge, "purge");

		obs::record_flow_outcome(FlowKind::Purge, FlowOutcome::Attempt);

		let result = span.instrument(async move { Ok(self.store.purge(now).await?) }).await;

		obs::record_result(FlowKind::Purge, &result);

		result
	}

	/// Drops every pending session, returning how many were discarded.
	pub async fn teardown(&self) -> Result<usize> {
		let span = FlowSpan::new(FlowKind::Purge, "teardown");

		obs::record_flow_outcome(FlowKind::Purge, FlowOutcome::Attempt);

		let result = span.instrument(async move { Ok(self.store.clear().await?) }).await;

		obs::record_result(FlowKind::Purge, &result);

		result
	}
}
impl Debug for Relay {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay").field("base_url", &self.base_url.as_str()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct FailingStore;
	impl RelayStore for FailingStore {
		fn deposit(&self, _: Secret, _: OffsetDateTime) -> RelayFuture<'_, SessionId> {
			Box::pin(async { Err(StoreError::Backend { message: "sheet offline".into() }) })
		}

		fn retrieve(&self, _: SessionId, _: OffsetDateTime) -> RelayFuture<'_, Option<Secret>> {
			Box::pin(async { Err(StoreError::Backend { message: "sheet offline".into() }) })
		}

		fn purge(&self, _: OffsetDateTime) -> RelayFuture<'_, usize> {
			Box::pin(async { Ok(0) })
		}

		fn clear(&self) -> RelayFuture<'_, usize> {
			Box::pin(async { Ok(0) })
		}
	}

	fn base() -> Url {
		Url::parse("https://relay.example.com/callback").expect("Base URL fixture should parse.")
	}

	#[test]
	fn link_embeds_the_id() {
		let relay = Relay::in_memory(base());
		let id = SessionId::new(482_913).expect("Fixture id should be valid.");

		assert_eq!(relay.link_for(id).as_str(), "https://relay.example.com/callback?id=482913");
	}

	#[tokio::test]
	async fn backend_failures_are_not_reported_as_misses() {
		let relay = Relay::new(Arc::new(FailingStore), base());
		let id = SessionId::new(123_456).expect("Fixture id should be valid.");

		assert!(matches!(relay.retrieve(id).await, Err(Error::Storage(_))));
		assert!(matches!(relay.deposit("code").await, Err(Error::Storage(_))));
	}
}
