// std
use std::sync::Arc;
// crates.io
use time::{Duration, macros};
// self
use account_session::{
	auth::{RecordKey, TokenId, TokenRecord, UserId},
	store::{MemoryTokenStore, StoreError, TokenStore},
};

fn key(user: &str, token: &str) -> RecordKey {
	RecordKey::new(
		UserId::new(user).expect("User identifier fixture should be valid."),
		TokenId::new(token).expect("Token identifier fixture should be valid."),
	)
}

#[tokio::test]
async fn trait_object_store_sets_checks_and_deletes() {
	let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
	let live = key("6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61", "0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10");
	let absent = key("6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61", "1c6d4d2f-9e64-4b9c-8b54-3a1a4c2a2e21");

	store.set(live, Duration::days(30)).await.expect("Set should succeed.");

	assert!(store.contains(&live).await.expect("Lookup should succeed."));
	assert!(!store.contains(&absent).await.expect("Lookup should succeed."));

	store.delete(&absent).await.expect("Deleting an absent key should succeed.");
	store.delete(&live).await.expect("Delete should succeed.");

	assert!(!store.contains(&live).await.expect("Lookup should succeed."));

	let err = store
		.set(live, Duration::ZERO)
		.await
		.expect_err("Zero TTLs must be rejected.");

	assert!(matches!(err, StoreError::NonPositiveTtl { .. }));
}

#[test]
fn records_expire_exactly_at_ttl() {
	let now = macros::datetime!(2025-06-01 08:00 UTC);
	let record = TokenRecord::new(
		key("6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61", "0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10"),
		now,
		Duration::hours(1),
	)
	.expect("Fixture expiry should be in range.");
	let store = MemoryTokenStore::default();

	assert!(record.is_live_at(now + Duration::minutes(59)));
	assert!(!record.is_live_at(now + Duration::hours(1)));

	store.set_at(record.key, Duration::hours(1), now).expect("Set should succeed.");

	assert!(store.contains_at(&record.key, now));
	assert_eq!(store.purge_expired_at(now + Duration::hours(2)), 1);
	assert!(store.is_empty());
	assert_eq!(store.purge_expired(), 0);
}
