//! Thread-safe in-memory [`TokenStore`] with lazy TTL expiry.

// self
use crate::{
	_prelude::*,
	auth::{RecordKey, TokenRecord},
	store::{self, StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<RecordKey, TokenRecord>>>;

/// In-process store for tests, demos, and single-node deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(StoreMap);
impl MemoryTokenStore {
	/// Records `key` as live for `ttl` measured from `now`.
	pub fn set_at(
		&self,
		key: RecordKey,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		let record = store::record_for(key, now, ttl)?;

		self.0.write().insert(key, record);

		Ok(())
	}

	/// Presence check at an explicit instant; expired entries are dropped on the way.
	pub fn contains_at(&self, key: &RecordKey, now: OffsetDateTime) -> bool {
		let live = match self.0.read().get(key) {
			Some(record) => record.is_live_at(now),
			None => return false,
		};

		if !live {
			let mut guard = self.0.write();

			if guard.get(key).is_some_and(|record| !record.is_live_at(now)) {
				guard.remove(key);
			}
		}

		live
	}

	/// Removes every record expired at `now`, returning how many were dropped.
	pub fn purge_expired_at(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, record| record.is_live_at(now));

		before - guard.len()
	}

	/// Removes every record that has expired by now.
	pub fn purge_expired(&self) -> usize {
		self.purge_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns the record for `key`, including expired ones not yet purged.
	pub fn record(&self, key: &RecordKey) -> Option<TokenRecord> {
		self.0.read().get(key).copied()
	}

	/// Number of stored records, including expired ones not yet purged.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` if nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryTokenStore {
	fn set(&self, key: RecordKey, ttl: Duration) -> StoreFuture<'_, ()> {
		let result = self.set_at(key, ttl, OffsetDateTime::now_utc());

		Box::pin(async move { result })
	}

	fn delete<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, ()> {
		self.0.write().remove(key);

		Box::pin(async { Ok(()) })
	}

	fn contains<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, bool> {
		let present = self.contains_at(key, OffsetDateTime::now_utc());

		Box::pin(async move { Ok(present) })
	}
}
