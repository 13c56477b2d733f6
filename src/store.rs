//! Token-store contract and built-in TTL store implementations.
//!
//! A store only records which refresh-token identifiers are live for a user. Values carry no
//! payload beyond presence and a time-to-live, matching a Redis `SET key 0 EX ttl` layout under
//! the `{userID}-refreshtoken:{tokenID}` key. Keys are partitioned by user and token, so
//! implementations never need cross-key coordination.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{
	_prelude::*,
	auth::{RecordKey, TokenRecord},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value store with per-key TTL tracking live refresh-token identifiers.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Records `key` as live for `ttl`, replacing any previous expiry.
	fn set(&self, key: RecordKey, ttl: Duration) -> StoreFuture<'_, ()>;

	/// Removes `key`; deleting an absent key succeeds.
	fn delete<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, ()>;

	/// Returns `true` if `key` is present and not yet expired.
	fn contains<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, bool>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// TTL was zero or negative.
	#[error("TTL for {key} must be positive.")]
	NonPositiveTtl {
		/// Rendered store key.
		key: String,
	},
	/// TTL pushed the expiry outside the representable date range.
	#[error("TTL for {key} is out of range.")]
	TtlOutOfRange {
		/// Rendered store key.
		key: String,
	},
}

/// Builds the record for `key` expiring `ttl` after `now`, rejecting unusable TTLs.
pub(crate) fn record_for(
	key: RecordKey,
	now: OffsetDateTime,
	ttl: Duration,
) -> Result<TokenRecord, StoreError> {
	if !ttl.is_positive() {
		return Err(StoreError::NonPositiveTtl { key: key.to_string() });
	}

	TokenRecord::new(key, now, ttl).ok_or_else(|| StoreError::TtlOutOfRange { key: key.to_string() })
}
